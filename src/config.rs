use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    model::error::BrowseError,
    util::object::{self, Provider},
};

pub const APP_NAME: &str = "s3-browser";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CACHE_DIR_NAME: &str = "s3_browser";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// The `aws` command line tool
    #[default]
    AwsCli,
    /// The AWS SDK with the default credential chain
    AwsSdk,
    /// Google Cloud Storage
    Gcs,
}

impl Backend {
    pub fn provider(&self) -> Provider {
        match self {
            Backend::AwsCli | Backend::AwsSdk => Provider::AWS,
            Backend::Gcs => Provider::GCS,
        }
    }
}

/// Settings as written in the TOML file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub aws_profile: Option<String>,
    pub aws_region: Option<String>,
}

/// Values from the environment or the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub aws_profile: Option<String>,
    pub aws_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `None` until the user configures one.
    pub bucket: Option<String>,
    pub prefix: String,
    pub cache_root: PathBuf,
    pub backend: Backend,
    pub aws_profile: Option<String>,
    pub aws_region: Option<String>,
}

impl Settings {
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn default_cache_root() -> PathBuf {
        std::env::temp_dir().join(CACHE_DIR_NAME)
    }

    /// Reads the config file (an explicit path must exist, the default one
    /// may not) and applies `overrides` on top.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, BrowseError> {
        let file = match path {
            Some(p) => Some(read_file(p)?),
            None => match Self::default_config_path() {
                Some(p) if p.exists() => Some(read_file(&p)?),
                _ => None,
            },
        };

        Self::from_parts(file.unwrap_or_default(), overrides)
    }

    pub fn from_parts(file: FileConfig, overrides: Overrides) -> Result<Self, BrowseError> {
        let bucket = overrides
            .bucket
            .or(file.bucket)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        let mut prefix = overrides.prefix.or(file.prefix);
        let mut backend = overrides.backend.or(file.backend).unwrap_or_default();

        let bucket = match bucket {
            None => None,
            Some(address) => {
                match object::parse_provider_from_uri(&address)? {
                    Some(Provider::GCS) => backend = Backend::Gcs,
                    Some(Provider::AWS) if backend == Backend::Gcs => backend = Backend::AwsCli,
                    _ => {}
                }

                let (name, key) = object::parse_object_uri(&address);
                if prefix.is_none() && !key.is_empty() {
                    prefix = Some(key.to_string());
                }
                if name.is_empty() {
                    return Err(BrowseError::InvalidConfig(format!(
                        "no bucket name in: {}",
                        address
                    )));
                }
                Some(name.to_string())
            }
        };

        Ok(Self {
            bucket,
            prefix: prefix.unwrap_or_default(),
            cache_root: overrides
                .cache_dir
                .or(file.cache_dir)
                .unwrap_or_else(Self::default_cache_root),
            backend,
            aws_profile: overrides.aws_profile.or(file.aws_profile),
            aws_region: overrides.aws_region.or(file.aws_region),
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, BrowseError> {
    let raw = fs::read_to_string(path).map_err(|err| BrowseError::io(path, err))?;

    toml::from_str(&raw).map_err(|err| {
        BrowseError::InvalidConfig(format!("failed to parse {}: {}", path.display(), err))
    })
}
