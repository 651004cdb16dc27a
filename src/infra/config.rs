//! Configuration management infrastructure.
//!
//! Allows tooling built on this crate to save and load signing preferences:
//! digest algorithm, timestamp authority, and detached-file naming.

use crate::domain::constants;
use crate::domain::file_name::DetachedSignatureFileName;
use crate::infra::error::{SigningError, SigningResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Signing preferences for tooling built on top of the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfiguration {
    /// Digest algorithm name ("sha512" is the only value the validation
    /// path currently accepts; "sha256" is reserved).
    pub digest_algorithm: String,

    /// Timestamp authority URL, if signatures should be timestamped.
    pub timestamp_url: Option<String>,

    /// Optional detached signature file identifier (e.g. ".originator").
    pub file_identifier: Option<String>,

    /// Certificate subject substring used when searching the store.
    pub certificate_subject: Option<String>,
}

impl Default for SigningConfiguration {
    fn default() -> Self {
        Self {
            digest_algorithm: constants::DEFAULT_DIGEST_ALGORITHM_NAME.to_string(),
            timestamp_url: None,
            file_identifier: None,
            certificate_subject: None,
        }
    }
}

impl SigningConfiguration {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> SigningResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SigningError::ConfigurationError(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| SigningError::ConfigurationError(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> SigningResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self).map_err(|e| {
            SigningError::ConfigurationError(format!("failed to serialize config: {e}"))
        })?;
        std::fs::write(path, contents)
            .map_err(|e| SigningError::ConfigurationError(format!("failed to write config: {e}")))?;
        log::info!("Saved signing configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SigningResult<()> {
        if self.digest_algorithm != constants::DEFAULT_DIGEST_ALGORITHM_NAME {
            return Err(SigningError::ConfigurationError(format!(
                "unsupported digest algorithm: {}",
                self.digest_algorithm
            )));
        }

        if let Some(url) = &self.timestamp_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SigningError::ConfigurationError(format!(
                    "timestamp URL must start with http:// or https://, got: {url}"
                )));
            }
        }

        if let Some(identifier) = &self.file_identifier {
            if !DetachedSignatureFileName::is_valid_file_identifier(identifier) {
                return Err(SigningError::ConfigurationError(format!(
                    "invalid detached signature file identifier: {identifier}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = SigningConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.digest_algorithm, "sha512");
    }

    #[test]
    fn rejects_unsupported_digest_algorithm() {
        let config = SigningConfiguration {
            digest_algorithm: "md5".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SigningError::ConfigurationError(_))
        ));
    }

    #[test]
    fn rejects_non_http_timestamp_url() {
        let config = SigningConfiguration {
            timestamp_url: Some("ftp://tsa.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_file_identifier() {
        let config = SigningConfiguration {
            file_identifier: Some("no-leading-dot".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = SigningConfiguration {
            digest_algorithm: "sha512".to_string(),
            timestamp_url: Some("https://tsa.example.com".to_string()),
            file_identifier: Some(".originator".to_string()),
            certificate_subject: Some("CN=Test".to_string()),
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: SigningConfiguration = toml::from_str(&text).unwrap();
        assert_eq!(parsed.timestamp_url, config.timestamp_url);
        assert_eq!(parsed.file_identifier, config.file_identifier);
    }
}
