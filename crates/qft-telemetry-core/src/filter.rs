//! Observation filter deciding which node types are tracked.
//!
//! The filter is a single configurable pattern matched against the host's
//! node type string. It is set once, before the run relies on it; changing
//! it mid-run only affects future entered-evaluations, never nodes already
//! tracked.

use regex::Regex;
use thiserror::Error;

/// Default pattern: test sets, test cases, test steps, procedure calls
/// and both sequence flavours.
pub const DEFAULT_OBSERVED_NODES: &str =
    "(Test((Set)|(Case)|(Step)))|(ProcedureCall)|(((Basic)|(TimeConstrained))Sequence)";

/// Error constructing an observation filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The observed-nodes pattern is not a valid regular expression.
    #[error("invalid observed-nodes pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying regex parse error.
        source: regex::Error,
    },
}

/// Compiled pattern deciding node-type eligibility.
///
/// Matching is total against the whole type string, so `TestCase` matches
/// the default pattern while `MyTestCaseX` does not.
#[derive(Debug, Clone)]
pub struct ObservationFilter {
    pattern: String,
    regex: Regex,
}

impl ObservationFilter {
    /// Compiles a filter from the given pattern.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        // Full-match semantics: the pattern must cover the whole type string.
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The configured pattern, as given (without anchoring).
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if the node type is eligible for tracking.
    ///
    /// Pure and total; never fails.
    #[must_use]
    pub fn matches(&self, node_type: &str) -> bool {
        self.regex.is_match(node_type)
    }
}

impl Default for ObservationFilter {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVED_NODES).expect("default observed-nodes pattern compiles")
    }
}
