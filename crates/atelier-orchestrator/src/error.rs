// Error types for the tutoring orchestration engine

use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] atelier_abstraction::ModelError),

    /// Vector store retrieval failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Web search provider failed
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// A state invariant did not hold
    ///
    /// Validation failures are recorded and the turn continues; this variant
    /// exists for callers that want to escalate a diagnostic into an error.
    #[error("Validation error at {node}: {reason}")]
    Validation {
        /// Graph node where the invariant was checked
        node: String,
        /// Which invariant failed
        reason: String,
    },

    /// A graph node failed to execute
    #[error("Node '{node}' failed: {reason}")]
    NodeExecution {
        /// Graph node that failed
        node: String,
        /// Failure description
        reason: String,
    },

    /// Turn cancelled at an await boundary
    #[error("Turn cancelled")]
    TurnCancelled,

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("Orchestration error: {0}")]
    Other(String),
}

impl OrchestrationError {
    /// Returns `true` when the error must abort the turn.
    ///
    /// Only cancellation propagates; every other failure has a local
    /// recovery path (heuristic fallback, offline corpus, trapped node).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrchestrationError::TurnCancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_abstraction::ModelError;

    #[test]
    fn test_only_cancellation_is_fatal() {
        assert!(OrchestrationError::TurnCancelled.is_fatal());
        assert!(!OrchestrationError::Retrieval("store down".to_string()).is_fatal());
        assert!(!OrchestrationError::Model(ModelError::Other("boom".to_string())).is_fatal());
        assert!(!OrchestrationError::NodeExecution {
            node: "domain_expert".to_string(),
            reason: "timeout".to_string(),
        }
        .is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = OrchestrationError::NodeExecution {
            node: "socratic_tutor".to_string(),
            reason: "model unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Node 'socratic_tutor' failed: model unavailable");
    }
}
