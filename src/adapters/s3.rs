use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use futures::{future::BoxFuture, FutureExt};
use tracing::{info, span, Instrument, Level};

use crate::{
    adapters,
    model::{error::BrowseError, listing::ListingPage},
};

impl adapters::ObjectAdapter for aws_sdk_s3::Client {
    fn run_listing<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<String, BrowseError>> {
        let span = span!(Level::INFO, "s3_listing", context = "s3_listing");
        async move {
            info!(bucket = bucket, prefix = prefix, "called");

            let lo = self
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .delimiter("/")
                .send()
                .await
                .map_err(|err| {
                    BrowseError::ListingFailed(format!(
                        "failed to list_objects at: {}, {}",
                        prefix,
                        DisplayErrorContext(&err)
                    ))
                })?;

            let page = ListingPage::from_parts(
                lo.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
                lo.contents()
                    .iter()
                    .filter_map(|o| o.key().map(|key| (key.to_string(), o.size()))),
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
        let span = span!(Level::INFO, "s3_fetch", context = "s3_fetch");
        async move {
            info!(bucket = bucket, key = key, dest = %dest.display(), "called");

            let o = self
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| {
                    BrowseError::FetchFailed(format!(
                        "failed to get_object: {}, {}",
                        key,
                        DisplayErrorContext(&err)
                    ))
                })?;

            let bytes = o.body.collect().await.map_err(|err| {
                BrowseError::FetchFailed(format!("failed to collect body: {}, {}", key, err))
            })?;

            tokio::fs::write(dest, bytes.into_bytes())
                .await
                .map_err(|err| {
                    BrowseError::FetchFailed(format!(
                        "failed to write {}: {}",
                        dest.display(),
                        err
                    ))
                })
        }
        .instrument(span)
        .boxed()
    }
}
