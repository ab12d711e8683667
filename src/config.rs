//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8000
//! failure_threshold = 2
//! reports_file = "problem_reports.json"
//! log_filter = "info"
//! ```
//!
//! Every key is optional. CLI flags override file values (see [`crate::cli`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::tracker::{validate_threshold, DEFAULT_FAILURE_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvisorConfig {
    pub host: String,
    pub port: u16,
    /// Prior FAILED sessions needed before escalating.
    pub failure_threshold: usize,
    pub reports_file: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reports_file: PathBuf::from("problem_reports.json"),
            log_filter: "info".to_string(),
        }
    }
}

impl AdvisorConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AdvisorConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AdvisorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.failure_threshold)?;
        if self.port == 0 {
            return Err(AdvisorError::config("port must be non-zero"));
        }
        if self.host.trim().is_empty() {
            return Err(AdvisorError::config("host must not be empty"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let c = AdvisorConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.failure_threshold, 2);
        assert_eq!(c.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let c = AdvisorConfig::from_toml_str("port = 9090\n").unwrap();
        assert_eq!(c.port, 9090);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.log_filter, "info");
    }

    #[test]
    fn test_full_toml() {
        let raw = r#"
            host = "0.0.0.0"
            port = 8080
            failure_threshold = 3
            reports_file = "/tmp/reports.json"
            log_filter = "diagnostic_advisor=debug"
        "#;
        let c = AdvisorConfig::from_toml_str(raw).unwrap();
        assert_eq!(c.failure_threshold, 3);
        assert_eq!(c.reports_file, PathBuf::from("/tmp/reports.json"));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = AdvisorConfig::from_toml_str("failure_threshold = 0").unwrap_err();
        assert!(matches!(err, AdvisorError::Config(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(AdvisorConfig::from_toml_str("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advisor.toml");
        std::fs::write(&path, "port = 7000").unwrap();
        assert_eq!(AdvisorConfig::load(&path).unwrap().port, 7000);
        assert!(AdvisorConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
