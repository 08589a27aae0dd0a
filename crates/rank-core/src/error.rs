//! Error types for rank-core.

use thiserror::Error;

/// Errors raised by the pure domain rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Rating score outside the accepted range.
    #[error("invalid score {score}: must be between {min} and {max}")]
    InvalidScore {
        /// The rejected score.
        score: i64,
        /// Lowest accepted score.
        min: u8,
        /// Highest accepted score.
        max: u8,
    },

    /// Vote direction other than +1 / -1.
    #[error("invalid vote direction {0}: must be 1 or -1")]
    InvalidDirection(i64),

    /// Identifier could not be parsed.
    #[error("invalid {kind} id: {reason}")]
    InvalidId {
        /// Entity kind the id belongs to.
        kind: &'static str,
        /// Parser message.
        reason: String,
    },

    /// A tunable holds a value the formulas cannot work with.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A vote transition tried to decrement a counter that is already zero.
    #[error("{counter} counter underflow: vote state and counters disagree")]
    CounterUnderflow {
        /// `"upvote"` or `"downvote"`.
        counter: &'static str,
    },
}

impl CoreError {
    /// Returns true for errors caused by caller input rather than stored state.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::CounterUnderflow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_score() {
        let err = CoreError::InvalidScore {
            score: 11,
            min: 1,
            max: 10,
        };
        assert_eq!(err.to_string(), "invalid score 11: must be between 1 and 10");
    }

    #[test]
    fn display_invalid_direction() {
        assert!(CoreError::InvalidDirection(0).to_string().contains("1 or -1"));
    }

    #[test]
    fn underflow_is_not_validation() {
        let err = CoreError::CounterUnderflow { counter: "upvote" };
        assert!(!err.is_validation());
        assert!(CoreError::InvalidDirection(2).is_validation());
    }
}
