//! Configuration management.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, `./pdf2bib.toml`, or `<config dir>/pdf2bib/config.toml`)
//! 3. `PDF2BIB_*` environment variables, e.g. `PDF2BIB_CROSSREF__MAILTO`
//! 4. command-line flags, applied by the binary
//!
//! # Configuration File Format
//!
//! ```toml
//! [crossref]
//! base_url = "https://api.crossref.org"
//! mailto = "me@example.org"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! search_rows = 1
//!
//! [tools]
//! pdftotext = "pdftotext"
//! exiftool = "/usr/local/bin/exiftool"
//!
//! [metadata]
//! tag = "BibTeX"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::CROSSREF_API_BASE;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PDF2BIB";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Bibliography service settings
    #[serde(default)]
    pub crossref: CrossRefConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Embedded metadata settings
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// CrossRef API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRefConfig {
    /// API root, overridable for mirrors and tests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address for the CrossRef polite pool
    #[serde(default)]
    pub mailto: Option<String>,

    /// Whole-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Rows requested from the fulltext search. Only the first is used.
    #[serde(default = "default_search_rows")]
    pub search_rows: u32,
}

impl Default for CrossRefConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            search_rows: default_search_rows(),
        }
    }
}

impl CrossRefConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_base_url() -> String {
    CROSSREF_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_search_rows() -> u32 {
    1
}

/// Paths of the external programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_pdftotext")]
    pub pdftotext: PathBuf,

    #[serde(default = "default_exiftool")]
    pub exiftool: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdftotext: default_pdftotext(),
            exiftool: default_exiftool(),
        }
    }
}

fn default_pdftotext() -> PathBuf {
    PathBuf::from("pdftotext")
}

fn default_exiftool() -> PathBuf {
    PathBuf::from("exiftool")
}

/// Embedded metadata settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// XMP-pdfx tag holding the cached BibTeX record
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { tag: default_tag() }
    }
}

fn default_tag() -> String {
    "BibTeX".to_string()
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find the first configuration file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("pdf2bib.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("pdf2bib").join("config.toml"))
        .filter(|path| path.is_file())
}
