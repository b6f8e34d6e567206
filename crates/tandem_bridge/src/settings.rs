//! Bridge settings

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// How the bridge bootstraps the secondary runtime and where it exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Global property holding the namespace object in every host context.
    pub namespace: String,
    /// Synthetic argument vector the secondary runtime starts with.
    pub argv: Vec<String>,
    /// Script run in the secondary context right after its globals are installed.
    pub preload: Option<String>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            namespace: "nw".to_string(),
            argv: vec!["tandem".to_string()],
            preload: None,
            log_filter: "info".to_string(),
        }
    }
}

impl BridgeSettings {
    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        let settings: BridgeSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let text = std::fs::read_to_string(path).map_err(|source| BridgeError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.namespace.trim().is_empty() {
            return Err(BridgeError::InvalidSettings(
                "namespace must not be empty".to_string(),
            ));
        }
        if self.argv.is_empty() {
            return Err(BridgeError::InvalidSettings(
                "argv needs at least the program name".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = BridgeSettings::from_json(r#"{ "namespace": "bridge" }"#).unwrap();
        assert_eq!(settings.namespace, "bridge");
        assert_eq!(settings.argv, vec!["tandem"]);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn empty_argv_is_rejected() {
        let err = BridgeSettings::from_json(r#"{ "argv": [] }"#).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidSettings(_)));
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("tandem.json");
        let err = BridgeSettings::load(&missing).unwrap_err();
        assert!(err.to_string().contains("tandem.json"));

        std::fs::write(&missing, r#"{ "log_filter": "debug" }"#).unwrap();
        assert_eq!(BridgeSettings::load(&missing).unwrap().log_filter, "debug");
    }
}
