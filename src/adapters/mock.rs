use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use futures::{future::BoxFuture, FutureExt};

use crate::{adapters, model::error::BrowseError};

/// Canned storage backend recording every call it receives.
#[derive(Default)]
pub struct MockClient {
    pub listings: HashMap<String, Result<String, String>>,
    pub body: Vec<u8>,
    pub fail_fetch: Option<String>,
    pub delay: Option<Duration>,
    pub listing_calls: Mutex<Vec<(String, String)>>,
    pub fetch_calls: Mutex<Vec<(String, String, PathBuf)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            body: b"object bytes".to_vec(),
            ..Default::default()
        }
    }

    pub fn with_listing(mut self, prefix: &str, raw: &str) -> Self {
        self.listings
            .insert(prefix.to_string(), Ok(raw.to_string()));
        self
    }

    pub fn with_listing_error(mut self, prefix: &str, message: &str) -> Self {
        self.listings
            .insert(prefix.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_fetch_failure(mut self, message: &str) -> Self {
        self.fail_fetch = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn listing_count(&self) -> usize {
        self.listing_calls.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.lock().unwrap().len()
    }
}

impl adapters::ObjectAdapter for MockClient {
    fn run_listing<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<String, BrowseError>> {
        async move {
            self.listing_calls
                .lock()
                .unwrap()
                .push((bucket.to_string(), prefix.to_string()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.listings.get(prefix) {
                None => Ok(String::new()),
                Some(Ok(raw)) => Ok(raw.clone()),
                Some(Err(message)) => Err(BrowseError::ListingFailed(message.clone())),
            }
        }
        .boxed()
    }

    fn run_fetch<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), BrowseError>> {
        async move {
            self.fetch_calls.lock().unwrap().push((
                bucket.to_string(),
                key.to_string(),
                dest.to_path_buf(),
            ));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(message) = &self.fail_fetch {
                // leave a truncated file behind, as an interrupted download would
                let _ = tokio::fs::write(dest, &self.body[..self.body.len() / 2]).await;
                return Err(BrowseError::FetchFailed(message.clone()));
            }

            tokio::fs::write(dest, &self.body)
                .await
                .map_err(|err| BrowseError::FetchFailed(err.to_string()))
        }
        .boxed()
    }
}
