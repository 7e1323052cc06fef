pub const DELIMITER: char = '/';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// One entry of a listed level. Built fresh on every listing; identity is
/// the `(bucket, key)` pair only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub bucket: String,
    /// Ends with `/` for folders, never for files.
    pub key: String,
    pub kind: NodeKind,
    pub size: Option<u64>,
}

impl TreeNode {
    pub fn folder(bucket: &str, label: &str, key: &str) -> Self {
        Self {
            label: label.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            kind: NodeKind::Folder,
            size: None,
        }
    }

    pub fn file(bucket: &str, label: &str, key: &str, size: Option<u64>) -> Self {
        Self {
            label: label.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            kind: NodeKind::File,
            size,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File)
    }
}
