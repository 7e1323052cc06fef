use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// No bucket configured; the user is prompted instead of listing.
    #[error("no bucket configured")]
    ConfigMissing,

    #[error("listing failed: {0}")]
    ListingFailed(String),

    #[error("failed to parse listing: {0}")]
    ListingParseError(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Key cannot be mapped under the cache root (folder key, `.` or `..` segment).
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BrowseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
