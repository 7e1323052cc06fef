//! Maps a node's kind onto the attributes a tree control displays.

use crate::{
    model::node::{NodeKind, TreeNode},
    util::object::{self, Provider},
};

pub const CONTEXT_VALUE: &str = "s3Item";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collapsible {
    None,
    Collapsed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemCommand {
    OpenFile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderItem {
    pub label: String,
    pub description: String,
    pub collapsible: Collapsible,
    pub command: Option<ItemCommand>,
    pub context_value: &'static str,
    pub tooltip: String,
}

pub fn render(node: &TreeNode, provider: Provider) -> RenderItem {
    let (collapsible, command, description) = match node.kind {
        NodeKind::Folder => (Collapsible::Collapsed, None, String::new()),
        NodeKind::File => (
            Collapsible::None,
            Some(ItemCommand::OpenFile),
            match node.size {
                Some(size) if size > 0 => format!("{} bytes", size),
                _ => String::new(),
            },
        ),
    };

    RenderItem {
        label: node.label.clone(),
        description,
        collapsible,
        command,
        context_value: CONTEXT_VALUE,
        tooltip: object::format_object_uri(provider, &node.bucket, &node.key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let cases = vec![
            (
                TreeNode::folder("b", "logs", "logs/"),
                Collapsible::Collapsed,
                None,
                "",
            ),
            (
                TreeNode::file("b", "a.txt", "a.txt", Some(42)),
                Collapsible::None,
                Some(ItemCommand::OpenFile),
                "42 bytes",
            ),
            (
                TreeNode::file("b", "empty", "empty", Some(0)),
                Collapsible::None,
                Some(ItemCommand::OpenFile),
                "",
            ),
        ];

        for (node, collapsible, command, description) in cases {
            let item = render(&node, Provider::AWS);

            assert_eq!(item.collapsible, collapsible, "failed for case: {}", node.key);
            assert_eq!(item.command, command, "failed for case: {}", node.key);
            assert_eq!(item.description, description, "failed for case: {}", node.key);
            assert_eq!(item.context_value, "s3Item");
            assert_eq!(item.tooltip, format!("s3://b/{}", node.key));
        }
    }

    #[test]
    fn test_render_gcs_tooltip() {
        let item = render(&TreeNode::file("data", "x", "dir/x", Some(1)), Provider::GCS);

        assert_eq!(item.tooltip, "gs://data/dir/x");
    }
}
