use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::recall::RecallConfig;

/// Application-level constants
pub const APP_NAME: &str = "QofRecall";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

const ENV_ADDR: &str = "QOF_RECALL_ADDR";
const ENV_DB: &str = "QOF_RECALL_DB";
const ENV_CATALOGUE: &str = "QOF_RECALL_CATALOGUE";
const ENV_SCAN_HOUR: &str = "QOF_RECALL_SCAN_HOUR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,qof_recall_lib=debug"
}

/// ~/QofRecall/ on all platforms.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    /// Override for the bundled indicator catalogue.
    pub catalogue_path: Option<PathBuf>,
    pub recall: RecallConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr_raw = lookup(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: ENV_ADDR,
            value: addr_raw.clone(),
        })?;

        let db_path = match lookup(ENV_DB) {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("recall.db"),
        };

        let mut recall = RecallConfig::default();
        if let Some(raw) = lookup(ENV_SCAN_HOUR) {
            recall.scan_hour_utc = raw
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or(ConfigError::InvalidValue {
                    name: ENV_SCAN_HOUR,
                    value: raw,
                })?;
        }

        Ok(Self {
            addr,
            db_path,
            catalogue_path: lookup(ENV_CATALOGUE).map(PathBuf::from),
            recall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("QofRecall"));
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
        assert!(config.db_path.ends_with("QofRecall/recall.db"));
        assert!(config.catalogue_path.is_none());
        assert_eq!(config.recall.scan_hour_utc, 8);
    }

    #[test]
    fn overrides_from_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("QOF_RECALL_ADDR", "0.0.0.0:8080"),
            ("QOF_RECALL_DB", "/tmp/practice.db"),
            ("QOF_RECALL_CATALOGUE", "/etc/qof.json"),
            ("QOF_RECALL_SCAN_HOUR", "6"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.db_path, PathBuf::from("/tmp/practice.db"));
        assert_eq!(config.catalogue_path, Some(PathBuf::from("/etc/qof.json")));
        assert_eq!(config.recall.scan_hour_utc, 6);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup_from(&[("QOF_RECALL_ADDR", "nowhere")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("QOF_RECALL_SCAN_HOUR", "24")])).is_err());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
