#![forbid(unsafe_code)]

//! Declarative configuration loaded from TOML.
//!
//! ```toml
//! root_prefix_cls = "acme"
//!
//! [affix]
//! offset_top = 64
//! prefix_cls = "acme-sticky"
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | Unreadable file | Missing path, permissions | [`ConfigError::Io`] |
//! | Malformed TOML | Syntax or type mismatch | [`ConfigError::Parse`] |
//! | NaN / infinite offset | Bad value | [`ConfigError::InvalidOffset`] |
//! | Empty prefix string | Bad value | [`ConfigError::EmptyPrefix`] |

use std::path::Path;

use serde::Deserialize;

use crate::context::AffixContext;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("offset `{field}` must be finite, got {value}")]
    InvalidOffset { field: &'static str, value: f64 },
    #[error("prefix `{field}` must not be empty")]
    EmptyPrefix { field: &'static str },
}

/// Widget defaults applied to every affix built from this config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AffixDefaults {
    pub offset_top: Option<f64>,
    pub offset_bottom: Option<f64>,
    pub prefix_cls: Option<String>,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AffixConfig {
    pub root_prefix_cls: Option<String>,
    #[serde(default)]
    pub affix: AffixDefaults,
}

impl AffixConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            root_prefix_cls = ?config.root_prefix_cls,
            offset_top = ?config.affix.offset_top,
            offset_bottom = ?config.affix.offset_bottom,
            "affix config loaded"
        );
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check value constraints that the TOML grammar cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_offset("affix.offset_top", self.affix.offset_top)?;
        check_offset("affix.offset_bottom", self.affix.offset_bottom)?;
        check_prefix("root_prefix_cls", self.root_prefix_cls.as_deref())?;
        check_prefix("affix.prefix_cls", self.affix.prefix_cls.as_deref())?;
        Ok(())
    }

    /// Apply the configured root prefix to a context.
    #[must_use]
    pub fn apply_to_context(&self, context: AffixContext) -> AffixContext {
        match &self.root_prefix_cls {
            Some(prefix) => context.with_root_prefix_cls(prefix.clone()),
            None => context,
        }
    }
}

fn check_offset(field: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(value) if !value.is_finite() => Err(ConfigError::InvalidOffset { field, value }),
        _ => Ok(()),
    }
}

fn check_prefix(field: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyPrefix { field }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config = AffixConfig::from_toml_str(
            r#"
            root_prefix_cls = "acme"

            [affix]
            offset_top = 64
            offset_bottom = 12.5
            prefix_cls = "acme-sticky"
            "#,
        )
        .unwrap();
        assert_eq!(config.root_prefix_cls.as_deref(), Some("acme"));
        assert_eq!(config.affix.offset_top, Some(64.0));
        assert_eq!(config.affix.offset_bottom, Some(12.5));
        assert_eq!(config.affix.prefix_cls.as_deref(), Some("acme-sticky"));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = AffixConfig::from_toml_str("").unwrap();
        assert_eq!(config, AffixConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AffixConfig::from_toml_str("[affix]\noffset_left = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = AffixConfig::from_toml_str("[affix]\noffset_top = \"ten\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let err = AffixConfig::from_toml_str("[affix]\noffset_bottom = nan\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOffset {
                field: "affix.offset_bottom",
                ..
            }
        ));
        assert!(err.to_string().contains("affix.offset_bottom"));
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let err = AffixConfig::from_toml_str("root_prefix_cls = \"  \"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyPrefix {
                field: "root_prefix_cls"
            }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AffixConfig::load("/nonexistent/affix.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn root_prefix_applies_to_context() {
        let config = AffixConfig::from_toml_str("root_prefix_cls = \"acme\"\n").unwrap();
        let ctx = config.apply_to_context(AffixContext::headless());
        assert_eq!(ctx.get_prefix_cls("affix", None), "acme-affix");

        let untouched = AffixConfig::default().apply_to_context(AffixContext::headless());
        assert_eq!(untouched.root_prefix_cls(), "ui");
    }
}
