use std::{
    io::Write,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, error, info};

use crate::{render::RenderItem, tree::Notifier};

/// Terminal host: results go to stdout, messages to stderr.
pub struct ConsoleNotifier {
    pub print_contents: bool,
    failed: AtomicBool,
}

impl ConsoleNotifier {
    pub fn new(print_contents: bool) -> Self {
        Self {
            print_contents,
            failed: AtomicBool::new(false),
        }
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

impl Notifier for ConsoleNotifier {
    fn prompt_configuration(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        eprintln!("{}", message);
    }

    fn show_error(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        eprintln!("error: {}", message);
    }

    fn show_info(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn display_file(&self, path: &Path) {
        if !self.print_contents {
            println!("{}", path.display());
            return;
        }

        let res = std::fs::read(path).and_then(|bytes| std::io::stdout().lock().write_all(&bytes));
        if let Err(err) = res {
            error!(error_message = %err, error_group = "display_file");
            self.show_error(&format!("failed to print {}: {}", path.display(), err));
        }
    }

    fn reveal_in_file_manager(&self, dir: &Path) {
        println!("{}", dir.display());
    }

    fn copy_to_clipboard(&self, text: &str) {
        println!("{}", text);
    }

    fn show_status(&self, text: &str, tooltip: &str) {
        info!(status = text, tooltip = tooltip, "status");
    }

    fn tree_changed(&self) {
        debug!("tree changed");
        println!();
    }
}

pub fn format_item(item: &RenderItem, level: usize, is_folder: bool) -> String {
    let mut line = format!("{}{}", "  ".repeat(level), item.label);
    if is_folder {
        line.push('/');
    }
    if !item.description.is_empty() {
        line.push_str("  ");
        line.push_str(&item.description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::node::TreeNode, render::render, util::object::Provider};

    #[test]
    fn test_format_item() {
        let cases = vec![
            (TreeNode::folder("b", "logs", "logs/"), 0, "logs/"),
            (TreeNode::file("b", "a.txt", "logs/a.txt", Some(5)), 1, "  a.txt  5 bytes"),
            (TreeNode::file("b", "empty", "empty", None), 2, "    empty"),
        ];

        for (node, level, expected) in cases {
            let line = format_item(&render(&node, Provider::AWS), level, node.is_folder());
            assert_eq!(line, expected, "failed for case: {}", node.key);
        }
    }

    #[test]
    fn test_errors_mark_failure() {
        let notifier = ConsoleNotifier::new(false);
        assert!(!notifier.failed());

        notifier.show_info("fine");
        assert!(!notifier.failed());

        notifier.show_error("boom");
        assert!(notifier.failed());
    }
}
