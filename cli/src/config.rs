use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use blockdoc::parser::ParserOptions;

/// Optional `blockdoc.toml` beside the working directory. Everything has a
/// default, so no config file is required at all.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the local draft store lives.
    pub drafts_dir: Option<PathBuf>,

    /// Iframe hosts accepted as embeds beyond the known services.
    pub extra_embed_hosts: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read '{}': {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const DEFAULT_CONFIG_FILE: &str = "blockdoc.toml";
const DEFAULT_DRAFTS_DIR: &str = ".blockdoc/drafts";

impl Config {
    /// Load an explicit config file, or `blockdoc.toml` if one is present,
    /// or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Config::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Config::from_file(default)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            extra_embed_hosts: self.extra_embed_hosts.clone(),
        }
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.drafts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DRAFTS_DIR))
    }
}
