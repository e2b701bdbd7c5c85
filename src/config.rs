//! Tunables for an inference run, loadable from TOML.

use crate::constraint;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read configuration file: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid configuration: {0}")]
  Parse(#[from] toml::de::Error),
}

/// How many times the solver re-enqueues a blocked constraint of each kind
/// before giving up on it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetryLimits {
  pub call: usize,
  pub member: usize,
  pub subscript: usize,
  pub infix: usize,
  pub bind: usize,
  pub conformance: usize,
  pub unwrap: usize,
  pub hoist: usize,
}

impl Default for RetryLimits {
  fn default() -> Self {
    Self {
      call: 8,
      member: 10,
      subscript: 2,
      infix: 2,
      bind: 4,
      conformance: 3,
      unwrap: 1,
      hoist: 32,
    }
  }
}

impl RetryLimits {
  pub fn limit_for(&self, kind: constraint::ConstraintKind) -> usize {
    match kind {
      // Equality never blocks.
      constraint::ConstraintKind::Equality => 0,
      constraint::ConstraintKind::Call => self.call,
      constraint::ConstraintKind::Member => self.member,
      constraint::ConstraintKind::Subscript => self.subscript,
      constraint::ConstraintKind::Infix => self.infix,
      constraint::ConstraintKind::Bind => self.bind,
      constraint::ConstraintKind::Conformance => self.conformance,
      constraint::ConstraintKind::Unwrap => self.unwrap,
      constraint::ConstraintKind::Hoist => self.hoist,
    }
  }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InferenceConfig {
  /// Whether `Optional`, `Array` and `print` are defined before the module
  /// is walked.
  pub prelude: bool,
  pub retry_limits: RetryLimits,
}

impl Default for InferenceConfig {
  fn default() -> Self {
    Self {
      prelude: true,
      retry_limits: RetryLimits::default(),
    }
  }
}

impl InferenceConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
    let source = std::fs::read_to_string(path)?;

    Self::from_toml_str(&source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn empty_document_uses_defaults() {
    let config = InferenceConfig::from_toml_str("").expect("empty config should parse");

    assert_eq!(InferenceConfig::default(), config);
  }

  #[test]
  fn partial_retry_limits_keep_remaining_defaults() {
    let config = InferenceConfig::from_toml_str(
      r#"
      prelude = false

      [retry-limits]
      call = 3
      "#,
    )
    .expect("config should parse");

    assert!(!config.prelude);
    assert_eq!(3, config.retry_limits.call);
    assert_eq!(RetryLimits::default().member, config.retry_limits.member);
    assert_eq!(
      3,
      config
        .retry_limits
        .limit_for(constraint::ConstraintKind::Call)
    );
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let result = InferenceConfig::from_toml_str("verbose = true");

    assert!(matches!(result, Err(ConfigError::Parse(..))));
  }

  #[test]
  fn missing_file_is_an_io_error() {
    let result = InferenceConfig::from_file("this/file/does/not/exist.toml");

    assert!(matches!(result, Err(ConfigError::Io(..))));
  }
}
