//! Local object cache: `cache_root/<key>`, fetched once and never refreshed.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::{error, info, span, warn, Instrument, Level};

use crate::{
    adapters,
    model::{error::BrowseError, node::DELIMITER},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Located {
    Cached(PathBuf),
    NotYetFetched,
}

type InFlight = Mutex<HashMap<(String, String), Arc<tokio::sync::Mutex<()>>>>;

pub struct ObjectCache {
    pub client: Arc<dyn adapters::ObjectAdapter>,
    pub root: PathBuf,
    in_flight: InFlight,
}

impl ObjectCache {
    pub fn new(client: Arc<dyn adapters::ObjectAdapter>, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Maps a key to its place under the cache root. Empty segments are
    /// dropped; `.`/`..` segments and folder keys are rejected.
    pub fn target_path(&self, key: &str) -> Result<PathBuf, BrowseError> {
        if key.ends_with(DELIMITER) {
            return Err(BrowseError::InvalidKey(format!("folder keys cannot be fetched: {}", key)));
        }

        let mut path = self.root.clone();
        let mut pushed = false;
        for segment in key.split(DELIMITER) {
            match segment {
                "" => continue,
                "." | ".." => {
                    return Err(BrowseError::InvalidKey(format!(
                        "relative segment in key: {}",
                        key
                    )))
                }
                s => {
                    path.push(s);
                    pushed = true;
                }
            }
        }

        if !pushed {
            return Err(BrowseError::InvalidKey(format!("empty key: {:?}", key)));
        }

        Ok(path)
    }

    /// Returns the local copy of `bucket/key`, fetching it on first use.
    pub async fn ensure_local(&self, bucket: &str, key: &str) -> Result<PathBuf, BrowseError> {
        let span = span!(Level::INFO, "ensure_local", context = "ensure_local");

        async {
            info!(bucket = bucket, key = key, "called");

            let target = self.target_path(key)?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| BrowseError::io(parent, err))?;
            }

            let guard = self.key_lock(bucket, key);
            let held = guard.lock().await;

            let res = self.fetch_once(bucket, key, &target).await;

            drop(held);
            self.release_key_lock(bucket, key, &guard);

            res.map(|_| target)
        }
        .instrument(span)
        .await
    }

    async fn fetch_once(&self, bucket: &str, key: &str, target: &Path) -> Result<(), BrowseError> {
        if is_file(target).await {
            info!(path = %target.display(), "cache hit");
            return Ok(());
        }

        match self.client.run_fetch(bucket, key, target).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(error_message = %err, error_group = "fetch");
                remove_partial(target).await;
                Err(match err {
                    BrowseError::FetchFailed(_) => err,
                    other => BrowseError::FetchFailed(other.to_string()),
                })
            }
        }
    }

    /// Presence check only; never fetches.
    pub async fn locate(&self, key: &str) -> Result<Located, BrowseError> {
        let target = self.target_path(key)?;

        if is_file(&target).await {
            Ok(Located::Cached(target))
        } else {
            Ok(Located::NotYetFetched)
        }
    }

    fn key_lock(&self, bucket: &str, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight
            .entry((bucket.to_string(), key.to_string()))
            .or_default()
            .clone()
    }

    fn release_key_lock(&self, bucket: &str, key: &str, guard: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        // map + this caller hold the only references once nobody else waits
        if Arc::strong_count(guard) <= 2 {
            in_flight.remove(&(bucket.to_string(), key.to_string()));
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!(path = %path.display(), "removed partial download"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => error!(error_message = %err, error_group = "remove_partial"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::mock::MockClient;

    fn cache(client: MockClient) -> (ObjectCache, Arc<MockClient>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(client);
        let cache = ObjectCache::new(client.clone(), dir.path().join("s3_browser"));
        (cache, client, dir)
    }

    #[test]
    fn test_target_path() {
        let (cache, _, _dir) = cache(MockClient::new());

        let cases = vec![
            ("reports/q1.csv", Some(vec!["reports", "q1.csv"])),
            ("file", Some(vec!["file"])),
            ("/lead//double", Some(vec!["lead", "double"])),
            ("a/../../etc/passwd", None),
            ("./file", None),
            ("folder/", None),
            ("", None),
        ];

        for (key, expected) in cases {
            let res = cache.target_path(key);
            match expected {
                Some(segments) => {
                    let mut path = cache.root.clone();
                    for s in segments {
                        path.push(s);
                    }
                    assert_eq!(res.unwrap(), path, "failed for case: {}", key);
                }
                None => assert!(
                    matches!(res, Err(BrowseError::InvalidKey(_))),
                    "failed for case: {}",
                    key
                ),
            }
        }
    }

    #[tokio::test]
    async fn test_first_fetch_creates_dirs() {
        let (cache, client, _dir) = cache(MockClient::new());

        let path = cache.ensure_local("bucket", "reports/q1.csv").await.unwrap();

        assert_eq!(path, cache.root.join("reports").join("q1.csv"));
        assert!(cache.root.join("reports").is_dir());
        assert_eq!(std::fs::read(&path).unwrap(), b"object bytes");
        assert_eq!(client.fetch_count(), 1);
        assert_eq!(
            client.fetch_calls.lock().unwrap()[0],
            ("bucket".to_string(), "reports/q1.csv".to_string(), path.clone())
        );
    }

    #[tokio::test]
    async fn test_second_fetch_is_cache_hit() {
        let (cache, client, _dir) = cache(MockClient::new());

        let first = cache.ensure_local("bucket", "a/b.txt").await.unwrap();
        let second = cache.ensure_local("bucket", "a/b.txt").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_removes_partial_file() {
        let (cache, client, _dir) = cache(MockClient::new().with_fetch_failure("NoSuchKey"));

        let res = cache.ensure_local("bucket", "a/b.txt").await;

        assert!(matches!(res, Err(BrowseError::FetchFailed(m)) if m == "NoSuchKey"));
        assert!(!cache.root.join("a").join("b.txt").exists());
        assert_eq!(cache.locate("a/b.txt").await.unwrap(), Located::NotYetFetched);

        // no poisoned cache entry: the next open tries again
        let _ = cache.ensure_local("bucket", "a/b.txt").await;
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_folder_key_is_never_fetched() {
        let (cache, client, _dir) = cache(MockClient::new());

        let res = cache.ensure_local("bucket", "reports/").await;

        assert!(matches!(res, Err(BrowseError::InvalidKey(_))));
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_opens_fetch_once() {
        let (cache, client, _dir) =
            cache(MockClient::new().with_delay(Duration::from_millis(20)));

        let (a, b) = tokio::join!(
            cache.ensure_local("bucket", "big.bin"),
            cache.ensure_local("bucket", "big.bin"),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(client.fetch_count(), 1);
        assert!(cache.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locate() {
        let (cache, client, _dir) = cache(MockClient::new());

        assert_eq!(cache.locate("x/y.txt").await.unwrap(), Located::NotYetFetched);

        let path = cache.ensure_local("bucket", "x/y.txt").await.unwrap();

        assert_eq!(cache.locate("x/y.txt").await.unwrap(), Located::Cached(path));
        assert_eq!(client.fetch_count(), 1);
    }
}
