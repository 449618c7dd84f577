//! CLI settings file.
//!
//! ```toml
//! [evaluation]
//! cycle_policy = "partial-outputs"
//! max_depth = 256
//! ```

use std::path::{Path, PathBuf};

use nodegraph_core::{CyclePolicy, EvalOptions};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Settings read from `--config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Evaluation round options.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// The `[evaluation]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Re-entry behaviour for cyclic graphs.
    #[serde(default)]
    pub cycle_policy: CyclePolicySetting,
    /// Maximum upstream nesting, unlimited when absent.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Spelling of [`CyclePolicy`] in the settings file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePolicySetting {
    /// `"error"`
    #[default]
    Error,
    /// `"partial-outputs"`
    PartialOutputs,
}

impl CliConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Options for evaluation rounds.
    pub fn eval_options(&self) -> EvalOptions {
        let policy = match self.evaluation.cycle_policy {
            CyclePolicySetting::Error => CyclePolicy::Error,
            CyclePolicySetting::PartialOutputs => CyclePolicy::PartialOutputs,
        };
        EvalOptions {
            cycle_policy: policy,
            max_depth: self.evaluation.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.eval_options(), EvalOptions::default());
    }

    #[test]
    fn test_evaluation_table() {
        let config = CliConfig::from_toml(
            r#"
            [evaluation]
            cycle_policy = "partial-outputs"
            max_depth = 32
            "#,
        )
        .unwrap();
        assert_eq!(
            config.eval_options(),
            EvalOptions::default()
                .with_cycle_policy(CyclePolicy::PartialOutputs)
                .with_max_depth(32)
        );
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = CliConfig::from_toml("[evaluation]\ncycle_policy = \"ignore\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(CliConfig::from_toml("[evaluation]\nmax_dpeth = 3\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = CliConfig::load("/nonexistent/nodegraph.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
        assert!(err.to_string().contains("/nonexistent/nodegraph.toml"));
    }
}
