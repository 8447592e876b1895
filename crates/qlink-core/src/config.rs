//! Pipeline Configuration
//!
//! One explicit value object drives both pipeline directions. There is no
//! ambient or global state: backend selection, encryption flag, key location,
//! framing parameters and checksum scope are all fixed here at construction
//! time, and the same value must be used on the TX and RX sides of a session.
//!
//! Configuration can be built in code or loaded from YAML:
//!
//! ```yaml
//! backend: simulated
//! encryption_enabled: true
//! key_path: /tmp/session.key
//! checksum_scope: fullframe
//! framing:
//!   layout: prefix
//!   preamble_byte: 170
//!   preamble_len: 0
//!   marker: [80, 82, 69, 65, 77, 66, 76, 69, 58, 58, 81, 76, 78, 75, 58, 58]
//!   policy: strict
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FrameError, FrameResult};
use crate::integrity::ChecksumScope;
use crate::preamble::FramingConfig;

/// Which collaborator carries frames between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process loopback / wire-artifact files, no RF chain involved.
    Simulated,
    /// Frames are handed to real flow-graph tooling outside this process.
    Hardware,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Simulated
    }
}

/// Complete pipeline configuration, shared by TX and RX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame transport backend.
    pub backend: Backend,
    /// Whether the encryption envelope stage runs.
    pub encryption_enabled: bool,
    /// Key file location; required when encryption is enabled. Written once
    /// per TX session, read once per RX session.
    pub key_path: Option<PathBuf>,
    /// Framing parameters (layout, preamble, marker, policy).
    pub framing: FramingConfig,
    /// Byte range the CRC trailer covers. Shared by both sides, never
    /// inferred.
    pub checksum_scope: ChecksumScope,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::simulated()
    }
}

impl PipelineConfig {
    /// Simulated local pipeline: prefix framing, full-frame checksum, no
    /// encryption.
    pub fn simulated() -> Self {
        Self {
            backend: Backend::Simulated,
            encryption_enabled: false,
            key_path: None,
            framing: FramingConfig::simulated(),
            checksum_scope: ChecksumScope::FullFrame,
        }
    }

    /// Hardware-oriented pipeline: bracketed over-the-air framing.
    pub fn hardware() -> Self {
        Self {
            backend: Backend::Hardware,
            framing: FramingConfig::over_the_air(),
            ..Self::simulated()
        }
    }

    /// Enable the encryption stage with the given key file path.
    pub fn with_encryption(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.encryption_enabled = true;
        self.key_path = Some(key_path.into());
        self
    }

    /// Load configuration from a YAML file.
    pub fn load_from(path: &Path) -> FrameResult<Self> {
        if !path.exists() {
            return Err(FrameError::MissingInput(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> FrameResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| FrameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save(&self, path: &Path) -> FrameResult<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| FrameError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FrameResult<()> {
        if self.encryption_enabled && self.key_path.is_none() {
            return Err(FrameError::InvalidConfig(
                "encryption is enabled but no key_path is set".to_string(),
            ));
        }
        if self.framing.marker.is_empty() {
            return Err(FrameError::InvalidConfig(
                "framing marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert_eq!(PipelineConfig::default().backend, Backend::Simulated);
    }

    #[test]
    fn test_encryption_requires_key_path() {
        let mut config = PipelineConfig::simulated();
        config.encryption_enabled = true;
        assert!(matches!(
            config.validate().unwrap_err(),
            FrameError::InvalidConfig(_)
        ));

        let config = PipelineConfig::simulated().with_encryption("/tmp/k.bin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = PipelineConfig::hardware().with_encryption("/tmp/session.key");
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back = PipelineConfig::parse(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parse_accepts_partial_yaml() {
        // Unspecified fields take their defaults.
        let config = PipelineConfig::parse("backend: hardware\n").unwrap();
        assert_eq!(config.backend, Backend::Hardware);
        assert!(!config.encryption_enabled);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = PipelineConfig::load_from(Path::new("/nonexistent/qlink.yaml")).unwrap_err();
        assert!(matches!(err, FrameError::MissingInput(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        let config = PipelineConfig::simulated().with_encryption(dir.path().join("k.bin"));
        config.save(&path).unwrap();
        assert_eq!(PipelineConfig::load_from(&path).unwrap(), config);
    }
}
