use std::path::{Path, PathBuf};

use twelf::{Layer, config};

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_PAGE_LIMIT: u32 = 10;
const DEFAULT_CONFIG_FILE: &str = "bookshelf.yaml";
const ENV_PREFIX: &str = "BOOKSHELF_";

#[config]
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// File backing the client-side key/value storage (holds the session token).
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Page size used for the catalog when none is given.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

pub fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookshelf")
}

fn default_storage_path() -> PathBuf {
    default_storage_dir().join("storage.json")
}

impl Config {
    /// Load defaults, then the YAML file (explicit path or `bookshelf.yaml` when present),
    /// then `BOOKSHELF_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut layers = Vec::new();
        match path {
            Some(p) => {
                anyhow::ensure!(p.exists(), "config file not found: {}", p.display());
                layers.push(Layer::Yaml(p.to_path_buf()));
            }
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    layers.push(Layer::Yaml(fallback.to_path_buf()));
                }
            }
        }
        layers.push(Layer::Env(Some(ENV_PREFIX.to_string())));
        let config = Config::with_layers(&layers)?;
        tracing::debug!(api_url = %config.api_url, storage = %config.storage_path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("BOOKSHELF_API_URL is missing".into());
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(format!(
                "BOOKSHELF_API_URL must be an http(s) URL, got {}",
                self.api_url
            ));
        }
        if self.page_limit == 0 {
            return Err("BOOKSHELF_PAGE_LIMIT must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            storage_path: default_storage_path(),
            page_limit: default_page_limit(),
        }
    }
}
