//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CPATH_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cpath.db";

/// Raw submissions log file name inside the root folder
pub const SUBMISSIONS_LOG_FILE: &str = "submissions.log";

/// Default listen address for cpath-web
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";

/// Default width of a career-length histogram bucket, in years
pub const DEFAULT_BUCKET_WIDTH_YEARS: u32 = 5;

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration file contents
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database and submissions log
    pub root_folder: Option<PathBuf>,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Career-length histogram bucket width in years (must be > 0)
    pub bucket_width_years: u32,
    /// Enables the destructive `/delete` endpoint
    pub allow_delete: bool,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            bucket_width_years: DEFAULT_BUCKET_WIDTH_YEARS,
            allow_delete: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Reject values that would break aggregation
    pub fn validate(&self) -> Result<()> {
        if self.bucket_width_years == 0 {
            return Err(Error::Config(
                "bucket_width_years must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform config file location: `<config_dir>/cpath/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cpath").join("config.toml"))
}

/// Load the TOML config from `path`
///
/// A missing file yields defaults. A file that exists but does not parse is
/// an error. Runs before logging is configured, so callers report the outcome.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config `root_folder`
/// 4. OS-dependent default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!("Root folder from command line");
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            debug!("Root folder from {}", env_var_name);
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        debug!("Root folder from config file");
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cpath"))
        .unwrap_or_else(|| PathBuf::from("./cpath_data"))
}

/// Creates the root folder and hands out paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn submissions_log_path(&self) -> PathBuf {
        self.root_folder.join(SUBMISSIONS_LOG_FILE)
    }
}
