use std::{path::Path, process::Output};

use futures::{future::BoxFuture, FutureExt};
use tokio::process::Command;
use tracing::{debug, info, span, Instrument, Level};

use crate::{adapters, model::error::BrowseError, util};

const DELIMITER: &str = "/";

/// Shells out to the `aws` command line tool, which resolves credentials on
/// its own.
pub struct AwsCli {
    pub program: String,
    pub profile: Option<String>,
    pub region: Option<String>,
}

impl AwsCli {
    pub fn new(profile: Option<String>, region: Option<String>) -> Self {
        Self {
            program: "aws".to_string(),
            profile,
            region,
        }
    }

    pub fn listing_args(&self, bucket: &str, prefix: &str) -> Vec<String> {
        let mut args = vec![
            "s3api".to_string(),
            "list-objects-v2".to_string(),
            "--bucket".to_string(),
            bucket.to_string(),
            "--prefix".to_string(),
            prefix.to_string(),
            "--delimiter".to_string(),
            DELIMITER.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        self.push_globals(&mut args);
        args
    }

    pub fn fetch_args(&self, bucket: &str, key: &str, dest: &Path) -> Vec<String> {
        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            util::object::format_object_uri(util::object::Provider::AWS, bucket, key),
            dest.to_string_lossy().to_string(),
            "--only-show-errors".to_string(),
        ];
        self.push_globals(&mut args);
        args
    }

    fn push_globals(&self, args: &mut Vec<String>) {
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
    }

    async fn exec(&self, args: Vec<String>) -> Result<String, String> {
        debug!(program = self.program, args = ?args, "executing");

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| format!("failed to run `{}`: {}", self.program, err))?;

        command_result(output)
    }
}

fn command_result(output: Output) -> Result<String, String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        Err(format!("command exited with {}", output.status))
    } else {
        Err(stderr)
    }
}

impl adapters::ObjectAdapter for AwsCli {
    fn run_listing<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<String, BrowseError>> {
        let span = span!(Level::INFO, "cli_listing", context = "cli_listing");
        async move {
            info!(bucket = bucket, prefix = prefix, "called");

            self.exec(self.listing_args(bucket, prefix))
                .await
                .map_err(BrowseError::ListingFailed)
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
        let span = span!(Level::INFO, "cli_fetch", context = "cli_fetch");
        async move {
            info!(bucket = bucket, key = key, dest = %dest.display(), "called");

            self.exec(self.fetch_args(bucket, key, dest))
                .await
                .map(|_| ())
                .map_err(BrowseError::FetchFailed)
        }
        .instrument(span)
        .boxed()
    }
}
