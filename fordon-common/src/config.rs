//! Configuration loading and root folder resolution
//!
//! The root folder holds everything the service persists (currently the
//! SQLite database). Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `FORDON_ROOT` environment variable
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent default data directory (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the SQLite database file inside the root folder
pub const DATABASE_FILE: &str = "fordon.db";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8580;

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Parse a TOML config file. A missing file is not an error; a file
    /// that exists but cannot be parsed is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Default config file location: `<os config dir>/fordon/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("fordon").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("fordon-config.toml"))
    }
}

/// Resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub port: u16,
}

impl Settings {
    /// Resolve settings from CLI arguments, environment, TOML config and
    /// compiled defaults, in that priority order.
    pub fn resolve(cli_root: Option<PathBuf>, cli_port: Option<u16>) -> Result<Self> {
        let toml_config = TomlConfig::load(&TomlConfig::default_path())?;

        let root_folder = cli_root
            .or_else(|| std::env::var("FORDON_ROOT").ok().map(PathBuf::from))
            .or(toml_config.root_folder)
            .unwrap_or_else(default_root_folder);

        let port = cli_port
            .or_else(|| {
                std::env::var("FORDON_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
            })
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        Ok(Settings { root_folder, port })
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fordon"))
        .unwrap_or_else(|| PathBuf::from("./fordon_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_appends_file_name() {
        let settings = Settings {
            root_folder: PathBuf::from("/tmp/fordon-test"),
            port: DEFAULT_PORT,
        };
        assert_eq!(
            settings.database_path(),
            PathBuf::from("/tmp/fordon-test/fordon.db")
        );
    }

    #[test]
    fn toml_config_parses_known_keys() {
        let config: TomlConfig =
            toml::from_str("root_folder = \"/srv/fordon\"\nport = 9000\n").unwrap();
        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/fordon")));
        assert_eq!(config.port, Some(9000));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = TomlConfig::load(Path::new("/nonexistent/fordon/config.toml")).unwrap();
        assert!(config.root_folder.is_none());
        assert!(config.port.is_none());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root_folder = [not toml").unwrap();
        assert!(TomlConfig::load(&path).is_err());
    }
}
