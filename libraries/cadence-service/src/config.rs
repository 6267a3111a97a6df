//! Service configuration

use crate::error::{Result, ServiceError};
use cadence_playback::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Playback session settings
    pub session: SessionConfig,

    /// Commands that may queue before senders block
    pub command_capacity: usize,

    /// Events that may queue before new ones are dropped
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            command_capacity: 64,
            event_capacity: 256,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables are prefixed with `CADENCE_`, and nested keys
    /// are separated by `__` (e.g. `CADENCE_SESSION__DUCK_VOLUME=0.2`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = settings.build()?.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(?loaded, "Service configuration loaded");
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let duck = self.session.duck_volume;
        if !(0.0..=1.0).contains(&duck) {
            return Err(ServiceError::Config(format!(
                "duck_volume must be within [0.0, 1.0], got {duck}"
            )));
        }

        if self.command_capacity == 0 {
            return Err(ServiceError::Config(
                "command_capacity must be greater than zero".to_string(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(ServiceError::Config(
                "event_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_playback::SourceKind;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.command_capacity, 64);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
event_capacity = 16

[session]
duck_volume = 0.25
max_decode_retries = 3
initial_source = "Library"
repeat = true
"#,
        );

        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.command_capacity, 64);
        assert_eq!(config.session.duck_volume, 0.25);
        assert_eq!(config.session.max_decode_retries, 3);
        assert_eq!(config.session.initial_source, SourceKind::Library);
        assert!(config.session.repeat);
        assert!(!config.session.shuffle);
        assert_eq!(config.session.fast_forward_ms, 3000);
    }

    #[test]
    fn out_of_range_duck_volume_is_rejected() {
        let file = toml_file("[session]\nduck_volume = 1.5\n");
        let err = ServiceConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ServiceError::Config(message) if message.contains("duck_volume")));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = ServiceConfig {
            command_capacity: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServiceConfig {
            event_capacity: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(ServiceConfig::load(Some(&path)).is_err());
    }
}
