//! Error types.

use thiserror::Error;

use crate::cp::SolveStatus;
use crate::validation::ValidationError;

/// Model construction failure.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The instance failed validation; no variable was created.
    #[error("Invalid instance ({} problem(s)): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationError>),
    /// The configuration is unusable; no variable was created.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// The validation errors behind this failure.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            BuildError::Invalid(errors) => errors,
            BuildError::Config(_) => &[],
        }
    }
}

/// Result extraction failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// The solve ended without a solution.
    #[error("No solution to extract: solver status {0}")]
    NoSolution(SolveStatus),
    /// A solved day has no calendar date from the configured epoch.
    #[error("Day {0} is outside the calendar range from the epoch")]
    DateOutOfRange(i64),
}

/// Configuration loading failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed JSON or wrong field types.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but unusable values.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_build_error_message() {
        let err = BuildError::Invalid(vec![
            ValidationError::new(ValidationErrorKind::EmptyProject, "Project 'P' has no tasks"),
            ValidationError::new(ValidationErrorKind::InvalidCapacity, "Resource 'R' has capacity 0"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid instance (2 problem(s))"));
        assert!(msg.contains("Project 'P' has no tasks; Resource 'R'"));
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_config_build_error_message() {
        let err: BuildError = ConfigError::Invalid("bypass tasks need an info_task".into()).into();
        assert_eq!(err.to_string(), "Invalid configuration: bypass tasks need an info_task");
        assert!(err.errors().is_empty());
    }

    #[test]
    fn test_extract_error_message() {
        let err = ExtractError::NoSolution(SolveStatus::Infeasible);
        assert_eq!(err.to_string(), "No solution to extract: solver status INFEASIBLE");
        assert_eq!(
            ExtractError::DateOutOfRange(9).to_string(),
            "Day 9 is outside the calendar range from the epoch"
        );
    }

    #[test]
    fn test_config_error_from_json() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
