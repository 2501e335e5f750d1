//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Every field has a default, so an empty object is a valid configuration.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::board::PcbLayer;
use crate::error::ConfigError;
use crate::import::{ConfiguredLayerResolver, ImportOptions, DEFAULT_ARC_SEGMENTS};

/// Accepted range for [`ImportConfig::arc_segments`].
pub const ARC_SEGMENT_RANGE: std::ops::RangeInclusive<u32> = 8..=360;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Import settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ARC_SEGMENT_RANGE.contains(&self.import.arc_segments) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "arc_segments must be between {} and {}, got {}",
                    ARC_SEGMENT_RANGE.start(),
                    ARC_SEGMENT_RANGE.end(),
                    self.import.arc_segments
                ),
            });
        }

        if let Some((source, target)) = self
            .import
            .layer_overrides
            .iter()
            .find(|(_, target)| PcbLayer::parse(target).is_none())
        {
            return Err(ConfigError::ValidationError {
                message: format!("Unknown host layer '{target}' for layer '{source}'"),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }

        Ok(())
    }
}

/// Import configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Record warnings about layers that map imperfectly onto the host.
    /// Default: true
    #[serde(default = "default_true")]
    pub log_layer_warnings: bool,

    /// Straight steps per full circle when arcs are approximated.
    /// Default: 32
    #[serde(default = "default_arc_segments")]
    pub arc_segments: u32,

    /// Host layer names by archive layer name.
    #[serde(default)]
    pub layer_overrides: IndexMap<String, String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            log_layer_warnings: true,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            layer_overrides: IndexMap::new(),
        }
    }
}

impl ImportConfig {
    /// Options for an import run.
    #[must_use]
    pub const fn options(&self) -> ImportOptions {
        ImportOptions {
            log_layer_warnings: self.log_layer_warnings,
            arc_segments: self.arc_segments,
        }
    }

    /// Layer resolver answering from [`Self::layer_overrides`].
    ///
    /// Entries naming an unknown host layer are dropped; [`Config::validate`]
    /// rejects them up front.
    #[must_use]
    pub fn layer_resolver(&self) -> ConfiguredLayerResolver {
        let overrides = self
            .layer_overrides
            .iter()
            .filter_map(|(source, target)| Some((source.clone(), PcbLayer::parse(target)?)))
            .collect();
        ConfiguredLayerResolver::new(overrides)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Default: "warn"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_arc_segments() -> u32 {
    DEFAULT_ARC_SEGMENTS
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config = parse("{}");
        assert!(config.import.log_layer_warnings);
        assert_eq!(config.import.arc_segments, 32);
        assert!(config.import.layer_overrides.is_empty());
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn schema_and_comment_are_ignored() {
        let config = parse(r#"{"$schema": "x.json", "_comment": "local setup"}"#);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"imports": {}}"#).is_err());
        assert!(serde_json::from_str::<Config>(r#"{"import": {"segments": 12}}"#).is_err());
    }

    #[test]
    fn arc_segments_outside_range_fail_validation() {
        for segments in [0, 7, 361] {
            let config = parse(&format!(r#"{{"import": {{"arc_segments": {segments}}}}}"#));
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("arc_segments"), "{err}");
        }
        for segments in [8, 64, 360] {
            let config = parse(&format!(r#"{{"import": {{"arc_segments": {segments}}}}}"#));
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn unknown_override_target_fails_validation() {
        let config = parse(r#"{"import": {"layer_overrides": {"Glue": "Glue.Top"}}}"#);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Glue.Top"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let config = parse(r#"{"logging": {"level": "loud"}}"#);
        assert!(config.validate().is_err());
        let config = parse(r#"{"logging": {"level": "DEBUG"}}"#);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn import_section_becomes_options() {
        let config = parse(r#"{"import": {"log_layer_warnings": false, "arc_segments": 90}}"#);
        let options = config.import.options();
        assert!(!options.log_layer_warnings);
        assert_eq!(options.arc_segments, 90);
    }
}
