//! Error types for shopsync-core.

use std::fmt;

use thiserror::Error;

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProblem {
    /// Environment variable name.
    pub var: &'static str,
    /// Why it was rejected ("not set", "must not include a scheme", ...).
    pub reason: String,
}

impl fmt::Display for ConfigProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.var, self.reason)
    }
}

/// Configuration validation failure.
///
/// Carries every missing/malformed field, not just the first, so one failed
/// run surfaces the whole problem set.
#[derive(Debug, Error)]
#[error("invalid configuration: {}", describe(.problems))]
pub struct ConfigError {
    pub problems: Vec<ConfigProblem>,
}

impl ConfigError {
    /// True if the named environment variable is among the problems.
    pub fn mentions(&self, var: &str) -> bool {
        self.problems.iter().any(|p| p.var == var)
    }
}

fn describe(problems: &[ConfigProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
