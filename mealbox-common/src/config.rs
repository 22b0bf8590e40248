//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the durable store lives, which port the
//! local API binds, which remote API the storefront talks to, and logging.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`MEALBOX_ROOT_FOLDER`, `MEALBOX_API_URL`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing or unreadable TOML file never aborts startup: a warning is logged
//! and compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MEALBOX_ROOT_FOLDER";

/// Environment variable overriding the remote storefront API base URL
pub const API_URL_ENV: &str = "MEALBOX_API_URL";

/// File name of the durable store inside the root folder
pub const DATABASE_FILE_NAME: &str = "mealbox.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the durable store (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Local HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the remote storefront API (catalog + favorites)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storefront behavior settings (optional)
    #[serde(default)]
    pub storefront: StorefrontSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Storefront behavior settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontSettings {
    /// Meals per browse page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before search / quick-filter changes are applied
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Estimated sales tax applied in the checkout summary
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    /// Timeout for remote API requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    5740
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_size() -> usize {
    9
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_tax_rate() -> f64 {
    0.08
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            tax_rate: default_tax_rate(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            api_base_url: default_api_base_url(),
            logging: LoggingConfig::default(),
            storefront: StorefrontSettings::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the storefront cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.storefront.page_size == 0 {
            return Err(Error::Config("storefront.page_size must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.storefront.tax_rate) {
            return Err(Error::Config(format!(
                "storefront.tax_rate must be in [0, 1): {}",
                self.storefront.tax_rate
            )));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("api_base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Load the TOML configuration with graceful degradation
///
/// Uses `explicit_path` when given, otherwise the platform config file.
/// Missing or invalid files yield [`TomlConfig::default`] and a warning.
pub fn load_config(explicit_path: Option<&Path>) -> TomlConfig {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory, using defaults");
                return TomlConfig::default();
            }
        },
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Config file {} not readable ({}), using defaults", path.display(), e);
            return TomlConfig::default();
        }
    };

    match TomlConfig::from_toml_str(&content) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Invalid config file {}: {}; using defaults", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Platform config file location (`<config_dir>/mealbox/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mealbox").join("config.toml"))
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("mealbox"))
            .unwrap_or_else(|| PathBuf::from("./mealbox_data"));

        Self {
            root_folder,
            log_level: default_log_level(),
            log_file: None,
            port: default_port(),
        }
    }
}

/// Root folder resolution following the priority order in the module docs
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder named in the loaded TOML config
    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        let defaults = CompiledDefaults::for_current_platform();
        info!(
            "[{}] Root folder from compiled default: {}",
            self.module_name,
            defaults.root_folder.display()
        );
        defaults.root_folder
    }
}

/// Creates the root folder and derives paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
