//! Listing engine: one delimiter listing turned into a sorted level of the tree.

use std::{cmp::Ordering, sync::Arc};

use icu_collator::{Collator, CollatorOptions};
use tracing::{debug, error, info, span, Instrument, Level};

use crate::{
    adapters,
    model::{
        error::BrowseError,
        listing::ListingPage,
        node::{TreeNode, DELIMITER},
    },
};

pub struct ListingEngine {
    pub client: Arc<dyn adapters::ObjectAdapter>,
}

impl ListingEngine {
    pub fn new(client: Arc<dyn adapters::ObjectAdapter>) -> Self {
        Self { client }
    }

    /// Lists one level under `prefix`: folders first, then files, each by label.
    pub async fn list_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<TreeNode>, BrowseError> {
        let prefix = normalize_prefix(prefix);
        let span = span!(Level::INFO, "list_prefix", context = "list_prefix");

        async {
            info!(bucket = bucket, prefix = prefix, "called");

            let raw = self.client.run_listing(bucket, &prefix).await?;
            let page = parse_listing(&raw)?;
            let nodes = build_nodes(bucket, &prefix, page);

            debug!(count = nodes.len(), "listed");
            Ok(nodes)
        }
        .instrument(span)
        .await
    }
}

pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(DELIMITER) {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, DELIMITER)
    }
}

pub fn parse_listing(raw: &str) -> Result<ListingPage, BrowseError> {
    if raw.trim().is_empty() {
        return Ok(ListingPage::default());
    }

    serde_json::from_str(raw).map_err(|err| BrowseError::ListingParseError(err.to_string()))
}

pub fn build_nodes(bucket: &str, prefix: &str, page: ListingPage) -> Vec<TreeNode> {
    let mut nodes = Vec::with_capacity(page.common_prefixes.len() + page.contents.len());

    for p in page.common_prefixes {
        let label = strip_leading(&p.prefix, prefix).trim_end_matches(DELIMITER);
        if label.is_empty() {
            continue;
        }
        nodes.push(TreeNode::folder(bucket, label, &p.prefix));
    }

    for c in page.contents {
        if c.key == prefix {
            continue;
        }
        let label = strip_leading(&c.key, prefix);
        if label.is_empty() || label.contains(DELIMITER) {
            debug!(key = c.key, "skipping nested entry");
            continue;
        }
        nodes.push(TreeNode::file(bucket, label, &c.key, c.size));
    }

    let collator = label_collator();
    nodes.sort_by(|a, b| compare_nodes(collator.as_ref(), a, b));
    nodes
}

fn strip_leading<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// Root-locale collator; `None` only if the built-in collation data fails to load.
pub fn label_collator() -> Option<Collator> {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(err) => {
            error!(error_message = %err, error_group = "collator");
            None
        }
    }
}

pub fn compare_nodes(collator: Option<&Collator>, a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_folder(), b.is_folder()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => locale_cmp(collator, &a.label, &b.label),
    }
}

/// Collation order, with the raw label as tie-break so the sort is total.
pub fn locale_cmp(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    collator
        .map(|c| c.compare(a, b))
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.cmp(b))
}
