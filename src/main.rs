use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use tracing::{error, info, span, Level};
use tracing_subscriber::EnvFilter;

mod adapters;
mod cache;
mod config;
mod console;
mod listing;
mod model;
mod render;
mod tree;
mod util;

use crate::{
    adapters::{cli::AwsCli, ObjectAdapter},
    config::{Backend, Overrides, Settings},
    console::ConsoleNotifier,
    model::{error::BrowseError, node::TreeNode},
};

#[derive(Parser)]
#[command(name = "s3browser", version, about = "Browse an object storage bucket as a folder tree")]
struct Cli {
    /// Bucket name or address (`s3://bucket/prefix`, `gs://bucket`)
    #[arg(long, env = "S3_BROWSER_BUCKET")]
    bucket: Option<String>,

    /// Folder shown as the root of the tree
    #[arg(long, env = "S3_BROWSER_PREFIX")]
    prefix: Option<String>,

    /// Where fetched objects are kept
    #[arg(long, env = "S3_BROWSER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// AWS profile passed to the CLI or the SDK
    #[arg(long)]
    profile: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Config file (defaults to `<config dir>/s3-browser/config.toml`)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one level of the tree
    Ls { prefix: Option<String> },
    /// Expand the tree from the root
    Tree {
        #[arg(long, default_value_t = 2)]
        depth: usize,
        /// Re-list the whole tree every SECONDS until interrupted
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,
    },
    /// Fetch an object (once) and print its local path
    Open {
        key: String,
        /// Print the object's bytes instead of its path
        #[arg(long)]
        print: bool,
    },
    /// Print the local directory holding an already fetched object
    Reveal { key: String },
    /// Print the object's address
    Path { key: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let cli = Cli::parse();

    let overrides = Overrides {
        bucket: cli.bucket,
        prefix: cli.prefix,
        cache_dir: cli.cache_dir,
        backend: cli.backend,
        aws_profile: cli.profile,
        aws_region: cli.region,
    };

    let settings = match Settings::load(cli.config.as_deref(), overrides) {
        Err(err) => {
            error!(error_message = %err, error_group = "config");
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
        Ok(s) => s,
    };
    info!(bucket = ?settings.bucket, prefix = settings.prefix, backend = ?settings.backend, "settings");

    let client = match build_client(&settings).await {
        Err(err) => {
            error!(error_message = %err, error_group = "client");
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
        Ok(c) => c,
    };

    let print_contents = matches!(cli.command, Commands::Open { print: true, .. });
    let notifier = Arc::new(ConsoleNotifier::new(print_contents));
    let adapter = tree::TreeAdapter::new(
        client,
        settings.backend.provider(),
        &settings.cache_root,
        notifier.clone(),
    );

    run(&adapter, &settings, cli.command).await;

    if notifier.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn build_client(settings: &Settings) -> Result<Arc<dyn ObjectAdapter>, BrowseError> {
    let client: Arc<dyn ObjectAdapter> = match settings.backend {
        Backend::AwsCli => Arc::new(AwsCli::new(
            settings.aws_profile.clone(),
            settings.aws_region.clone(),
        )),
        Backend::AwsSdk => {
            let mut loader = aws_config::from_env();
            if let Some(profile) = &settings.aws_profile {
                loader = loader.profile_name(profile);
            }
            if let Some(region) = &settings.aws_region {
                loader = loader.region(aws_config::Region::new(region.clone()));
            }
            let config = loader.load().await;

            Arc::new(aws_sdk_s3::Client::new(&config))
        }
        Backend::Gcs => {
            let config = google_cloud_storage::client::ClientConfig::default()
                .with_auth()
                .await
                .map_err(|err| {
                    BrowseError::InvalidConfig(format!("failed to authenticate with GCS: {}", err))
                })?;

            Arc::new(google_cloud_storage::client::Client::new(config))
        }
    };

    Ok(client)
}

async fn run(adapter: &tree::TreeAdapter, settings: &Settings, command: Commands) {
    match command {
        Commands::Ls { prefix: None } => {
            for node in adapter.get_root_nodes(settings).await {
                print_node(adapter, &node, 0);
            }
        }
        Commands::Ls {
            prefix: Some(prefix),
        } => {
            if let Some(folder) = adapter.node_for_input(settings, &prefix, true) {
                for node in adapter.get_children(&folder).await {
                    print_node(adapter, &node, 0);
                }
            }
        }
        Commands::Tree { depth, watch: None } => print_tree(adapter, settings, depth).await,
        Commands::Tree {
            depth,
            watch: Some(secs),
        } => {
            let period = Duration::from_secs(secs.max(1));
            loop {
                print_tree(adapter, settings, depth).await;

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(period) => adapter.refresh(),
                }
            }
        }
        Commands::Open { key, .. } => {
            if let Some(node) = adapter.node_for_input(settings, &key, false) {
                adapter.open_node(&node).await;
            }
        }
        Commands::Reveal { key } => {
            if let Some(node) = adapter.node_for_input(settings, &key, false) {
                adapter.reveal_node(&node).await;
            }
        }
        Commands::Path { key } => {
            if let Some(node) = adapter.node_for_input(settings, &key, false) {
                adapter.show_path(&node);
            }
        }
    }
}

async fn print_tree(adapter: &tree::TreeAdapter, settings: &Settings, depth: usize) {
    let roots = adapter.get_root_nodes(settings).await;
    let mut stack: Vec<(TreeNode, usize)> = roots.into_iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, level)) = stack.pop() {
        print_node(adapter, &node, level);
        if node.is_folder() && level + 1 < depth {
            let children = adapter.get_children(&node).await;
            stack.extend(children.into_iter().rev().map(|c| (c, level + 1)));
        }
    }
}

fn print_node(adapter: &tree::TreeAdapter, node: &TreeNode, level: usize) {
    println!(
        "{}",
        console::format_item(&render::render(node, adapter.provider), level, node.is_folder())
    );
}
