// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub listen_addr: String,
    pub base_url: String,
    pub user_agent: String,
    pub scrape_interval_secs: u64,
    pub scrape_timeout_secs: u64,
    /// When set, every published snapshot is also written under this
    /// directory. Off by default.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            base_url: "https://www.nseindia.com".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0 Safari/537.36"
                .to_string(),
            scrape_interval_secs: 300,
            scrape_timeout_secs: 120,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration using env var + fallbacks:
    /// 1) $APP_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    /// Individual env vars override whatever the file provided.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(&p);
            if !pb.exists() {
                return Err(anyhow!("APP_CONFIG_PATH points to non-existent path"));
            }
            Self::from_file(&pb)?
        } else {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::from_file(fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config from {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("LISTEN_ADDR") {
            self.listen_addr = v;
        } else if let Ok(port) = env::var("PORT") {
            // PaaS convention: only the port is injected
            self.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Ok(v) = env::var("NSE_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = env::var("SCRAPE_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                self.scrape_interval_secs = n;
            }
        }
        if let Ok(v) = env::var("SCRAPE_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.scrape_timeout_secs = n;
            }
        }
        if let Ok(v) = env::var("DATA_DIR") {
            self.data_dir = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs.max(1))
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs.max(1))
    }
}
