//! Configuration file format.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:9993"
//!
//! [caspar]
//! host = "127.0.0.1"
//! port = 5250
//! channel = 1
//! layer = 1
//! connect_timeout_secs = 10
//!
//! [catalog]
//! refresh_interval_secs = 15
//!
//! [logging]
//! log_dir = "logs"
//! retention_days = 7
//! level = "info"
//! ```
//!
//! Every key is optional. Command line and environment values win over the
//! file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "caspardeck.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this format.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub caspar: CasparSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub listen: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CasparSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub channel: Option<u32>,
    pub layer: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CatalogSection {
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

/// Explicit path, or the default file if it exists in the working directory.
pub fn locate(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    })
}

pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(contents: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = parse_config(
            r#"
[server]
listen = "127.0.0.1:9993"

[caspar]
host = "playout.local"
port = 5251
channel = 2
layer = 10
connect_timeout_secs = 3

[catalog]
refresh_interval_secs = 30

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.server.listen.as_deref(), Some("127.0.0.1:9993"));
        assert_eq!(config.caspar.host.as_deref(), Some("playout.local"));
        assert_eq!(config.caspar.port, Some(5251));
        assert_eq!((config.caspar.channel, config.caspar.layer), (Some(2), Some(10)));
        assert_eq!(config.caspar.connect_timeout_secs, Some(3));
        assert_eq!(config.catalog.refresh_interval_secs, Some(30));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.log_dir, None);
    }

    #[test]
    fn test_parse_empty() {
        let config = parse_config("").unwrap();
        assert!(config.server.listen.is_none());
        assert!(config.caspar.host.is_none());
    }

    #[test]
    fn test_parse_error() {
        assert!(parse_config("[caspar]\nport = \"not a port\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/caspardeck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
