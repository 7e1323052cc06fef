use std::path::Path;

use futures::{future::BoxFuture, FutureExt};
use google_cloud_storage::http::objects::{
    download::Range, get::GetObjectRequest, list::ListObjectsRequest,
};
use tracing::{info, span, Instrument, Level};

use crate::{
    adapters,
    model::{error::BrowseError, listing::ListingPage},
};

impl adapters::ObjectAdapter for google_cloud_storage::client::Client {
    fn run_listing<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<String, BrowseError>> {
        let span = span!(Level::INFO, "gcs_listing", context = "gcs_listing");
        async move {
            info!(bucket = bucket, prefix = prefix, "called");

            let req = ListObjectsRequest {
                bucket: bucket.to_string(),
                prefix: Some(prefix.to_string()),
                delimiter: Some("/".to_string()),
                ..Default::default()
            };

            let lo = self.list_objects(&req).await.map_err(|err| {
                BrowseError::ListingFailed(format!(
                    "failed to list_objects at: {}, {}",
                    prefix, err
                ))
            })?;

            let page = ListingPage::from_parts(
                lo.prefixes.unwrap_or_default(),
                lo.items
                    .unwrap_or_default()
                    .into_iter()
                    .map(|obj| (obj.name, Some(obj.size))),
            );

            Ok(page.to_json())
        }
        .instrument(span)
        .boxed()
    }

    fn run_fetch<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), BrowseError>> {
        let span = span!(Level::INFO, "gcs_fetch", context = "gcs_fetch");
        async move {
            info!(bucket = bucket, key = key, dest = %dest.display(), "called");

            let req = GetObjectRequest {
                bucket: bucket.to_string(),
                object: key.to_string(),
                ..Default::default()
            };

            let bytes = self
                .download_object(&req, &Range::default())
                .await
                .map_err(|err| {
                    BrowseError::FetchFailed(format!("failed to download_object: {}, {}", key, err))
                })?;

            tokio::fs::write(dest, bytes).await.map_err(|err| {
                BrowseError::FetchFailed(format!("failed to write {}: {}", dest.display(), err))
            })
        }
        .instrument(span)
        .boxed()
    }
}
