//! Wire shape of a delimiter listing, as printed by
//! `aws s3api list-objects-v2 --output json`.
//!
//! The SDK backends re-encode their responses into the same shape so the
//! listing engine has a single parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(rename = "CommonPrefixes", default, skip_serializing_if = "Vec::is_empty")]
    pub common_prefixes: Vec<CommonPrefix>,
    #[serde(rename = "Contents", default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonPrefix {
    #[serde(rename = "Prefix")]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Size", default)]
    pub size: Option<u64>,
}

impl ListingPage {
    /// Builds a page from SDK output. Negative sizes are reported as unknown.
    pub fn from_parts<P, O>(prefixes: P, objects: O) -> Self
    where
        P: IntoIterator<Item = String>,
        O: IntoIterator<Item = (String, Option<i64>)>,
    {
        Self {
            common_prefixes: prefixes
                .into_iter()
                .map(|prefix| CommonPrefix { prefix })
                .collect(),
            contents: objects
                .into_iter()
                .map(|(key, size)| ObjectEntry {
                    key,
                    size: size.and_then(|s| u64::try_from(s).ok()),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
