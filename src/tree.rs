//! Routes host events (expand, open, reveal, copy path) to the listing engine
//! and the object cache. Every failure ends here as a notification.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tracing::{debug, error, info, span, warn, Level};

use crate::{
    adapters,
    cache::{Located, ObjectCache},
    config::Settings,
    listing::{self, ListingEngine},
    model::{error::BrowseError, node::TreeNode},
    util::object::{self, Provider},
};

pub const CONFIG_PROMPT: &str =
    "Set a bucket (--bucket, S3_BROWSER_BUCKET or `bucket` in config.toml) to use the S3 browser.";
pub const NOT_YET_FETCHED: &str = "File not yet downloaded. Click to open first.";

/// What the host shell provides: message display, file display and the like.
pub trait Notifier: Send + Sync {
    fn prompt_configuration(&self, message: &str);
    fn show_error(&self, message: &str);
    fn show_info(&self, message: &str);
    fn display_file(&self, path: &Path);
    fn reveal_in_file_manager(&self, dir: &Path);
    fn copy_to_clipboard(&self, text: &str);
    fn show_status(&self, text: &str, tooltip: &str);
    fn tree_changed(&self);
}

pub struct TreeAdapter {
    pub listing: ListingEngine,
    pub cache: ObjectCache,
    pub notifier: Arc<dyn Notifier>,
    pub provider: Provider,
    generation: AtomicU64,
}

impl TreeAdapter {
    pub fn new(
        client: Arc<dyn adapters::ObjectAdapter>,
        provider: Provider,
        cache_root: &Path,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            listing: ListingEngine::new(client.clone()),
            cache: ObjectCache::new(client, cache_root),
            notifier,
            provider,
            generation: AtomicU64::new(0),
        }
    }

    pub fn refresh(&self) {
        let span = span!(Level::INFO, "refresh", context = "refresh");
        let _e = span.enter();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation = generation, "called");
        self.notifier.tree_changed();
    }

    pub async fn get_root_nodes(&self, settings: &Settings) -> Vec<TreeNode> {
        let bucket = match settings.bucket.as_deref() {
            None | Some("") => {
                warn!(error_message = %BrowseError::ConfigMissing, error_group = "get_root_nodes");
                self.notifier.prompt_configuration(CONFIG_PROMPT);
                return Vec::new();
            }
            Some(b) => b,
        };

        self.list(bucket, &settings.prefix).await
    }

    pub async fn get_children(&self, node: &TreeNode) -> Vec<TreeNode> {
        if node.is_file() {
            debug!(key = node.key, "files have no children");
            return Vec::new();
        }

        self.list(&node.bucket, &node.key).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Vec<TreeNode> {
        let started = self.generation.load(Ordering::SeqCst);

        let res = self.listing.list_prefix(bucket, prefix).await;

        if self.generation.load(Ordering::SeqCst) != started {
            info!(bucket = bucket, prefix = prefix, "discarding stale listing");
            return Vec::new();
        }

        match res {
            Ok(nodes) => nodes,
            Err(err) => {
                error!(error_message = %err, error_group = "list_prefix");
                self.notifier.show_error(&listing_message(&err));
                Vec::new()
            }
        }
    }

    pub async fn open_node(&self, node: &TreeNode) -> Option<std::path::PathBuf> {
        match self.cache.ensure_local(&node.bucket, &node.key).await {
            Ok(path) => {
                self.notifier.display_file(&path);
                Some(path)
            }
            Err(err) => {
                error!(error_message = %err, error_group = "open_node");
                self.notifier
                    .show_error(&format!("Failed to open S3 file: {}", fetch_message(&err)));
                None
            }
        }
    }

    pub async fn locate_path(&self, node: &TreeNode) -> Result<Located, BrowseError> {
        self.cache.locate(&node.key).await
    }

    pub async fn reveal_node(&self, node: &TreeNode) {
        match self.locate_path(node).await {
            Ok(Located::Cached(path)) => {
                let dir = path.parent().unwrap_or(&self.cache.root);
                self.notifier.reveal_in_file_manager(dir);
            }
            Ok(Located::NotYetFetched) => self.notifier.show_info(NOT_YET_FETCHED),
            Err(err) => {
                error!(error_message = %err, error_group = "reveal_node");
                self.notifier.show_error(&err.to_string());
            }
        }
    }

    pub fn show_path(&self, node: &TreeNode) -> String {
        let address = object::format_object_uri(self.provider, &node.bucket, &node.key);

        self.notifier.copy_to_clipboard(&address);
        self.notifier
            .show_info(&format!("S3 Path copied: {}", address));
        self.notifier
            .show_status(object::basename(&node.key), &address);

        address
    }

    /// Turns user input (a bare key, or a full `s3://bucket/key` address)
    /// into a node. An address whose scheme belongs to another provider
    /// than the connected backend is refused.
    pub fn node_for_input(&self, settings: &Settings, input: &str, folder: bool) -> Option<TreeNode> {
        let (bucket, key) = match object::parse_provider_from_uri(input) {
            Err(err) => {
                self.notifier.show_error(&err.to_string());
                return None;
            }
            Ok(Some(provider)) if provider != self.provider => {
                warn!(input = input, "address scheme does not match backend");
                self.notifier.show_error(&format!(
                    "{} is not reachable with the configured backend (expected a {} address)",
                    input,
                    self.provider.scheme()
                ));
                return None;
            }
            Ok(Some(_)) => {
                let (bucket, key) = object::parse_object_uri(input);
                (Some(bucket.to_string()), key.to_string())
            }
            Ok(None) => (settings.bucket.clone(), input.to_string()),
        };

        let bucket = match bucket.filter(|b| !b.is_empty()) {
            None => {
                self.notifier.prompt_configuration(CONFIG_PROMPT);
                return None;
            }
            Some(b) => b,
        };

        let label = object::basename(&key);
        Some(if folder {
            TreeNode::folder(&bucket, label, &listing::normalize_prefix(&key))
        } else {
            TreeNode::file(&bucket, label, &key, None)
        })
    }
}

fn listing_message(err: &BrowseError) -> String {
    match err {
        BrowseError::ListingParseError(_) => "Failed to parse aws output.".to_string(),
        BrowseError::ListingFailed(message) => format!("aws CLI error: {}", message),
        other => format!("aws CLI error: {}", other),
    }
}

fn fetch_message(err: &BrowseError) -> String {
    match err {
        BrowseError::FetchFailed(message) => message.clone(),
        other => other.to_string(),
    }
}
