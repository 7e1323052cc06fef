use std::path::Path;

use futures::future::BoxFuture;

use crate::model;

pub mod cli;
pub mod gcs;
#[cfg(test)]
pub mod mock;
pub mod s3;

/// The two storage calls the browser needs. Listing returns the raw JSON
/// document (see `model::listing`); parsing belongs to the listing engine.
pub trait ObjectAdapter: Send + Sync {
    fn run_listing<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<String, model::error::BrowseError>>;

    fn run_fetch<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), model::error::BrowseError>>;
}
