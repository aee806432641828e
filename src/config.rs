//! Configuration loading.
//!
//! Looks for `retail-insights.toml` in the working directory unless a path
//! is given explicitly, and falls back to an embedded default. Secrets come
//! from the environment (a `.env` file is honoured by `main`).

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "retail-insights.toml";

pub const ENV_ACCESS_TOKEN: &str = "RETAIL_INSIGHTS_ACCESS_TOKEN";
pub const ENV_SERVICE_ACCOUNT: &str = "RETAIL_INSIGHTS_SERVICE_ACCOUNT";

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[source]
kind = "inline"

[cache]
ttl_secs = 600

[display]
currency_prefix = "$"
color = true
"#;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the orders table comes from.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Sample orders compiled into the binary.
    #[default]
    Inline,
    /// Local CSV export.
    Csv { path: PathBuf },
    /// CSV export of one sheet, fetched over HTTP.
    SheetExport {
        spreadsheet_id: String,
        #[serde(default = "default_gid")]
        gid: String,
        #[serde(default)]
        access_token: Option<String>,
    },
    /// Sheets API `values` endpoint.
    SheetsApi {
        spreadsheet_id: String,
        #[serde(default = "default_range")]
        range: String,
        #[serde(default)]
        access_token: Option<String>,
        /// Inline service-account key JSON. Usually supplied through
        /// `RETAIL_INSIGHTS_SERVICE_ACCOUNT` rather than the file.
        #[serde(default)]
        service_account: Option<String>,
        #[serde(default)]
        credentials_path: Option<PathBuf>,
    },
}

fn default_gid() -> String {
    "0".to_string()
}

fn default_range() -> String {
    "A1:Z".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_currency_prefix() -> String {
    "$".to_string()
}

fn default_color() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_prefix: default_currency_prefix(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParseConfig {
    /// chrono format tried before the built-in ones, e.g. `%d/%m/%Y`.
    #[serde(default)]
    pub date_format: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Replaces the built-in recommendation list when set.
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
}

impl Config {
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("Invalid configuration")
    }

    /// Fill credentials from the environment when the file leaves them out.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env_token = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty());
        match &mut self.source {
            SourceConfig::SheetExport { access_token, .. } => {
                if access_token.is_none() {
                    *access_token = env_token;
                }
            }
            SourceConfig::SheetsApi {
                access_token,
                service_account,
                ..
            } => {
                if access_token.is_none() {
                    *access_token = env_token;
                }
                if service_account.is_none() {
                    *service_account = lookup(ENV_SERVICE_ACCOUNT).filter(|v| !v.is_empty());
                }
            }
            SourceConfig::Inline | SourceConfig::Csv { .. } => {}
        }
    }
}

/// Load configuration.
///
/// Search order:
/// 1. The explicit path, which must exist
/// 2. `retail-insights.toml` in the working directory
/// 3. The embedded default
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let local = Path::new(CONFIG_FILE_NAME);
            if local.exists() {
                read_config(local)?
            } else {
                tracing::debug!("Using default embedded configuration");
                Config::from_toml(DEFAULT_CONFIG)?
            }
        }
    };
    config.apply_env();
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading config from: {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Config::from_toml(&contents).with_context(|| format!("In {}", path.display()))
}
