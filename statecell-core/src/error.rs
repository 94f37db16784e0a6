//! Error types surfaced by the store engine and reducer combinator

use std::sync::Arc;

/// Result alias used throughout statecell
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised synchronously by store operations.
///
/// The engine never swallows these: every variant is returned to the caller of
/// the offending operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Malformed arguments: untyped or non-record action, several enhancers,
    /// dispatching while middleware is being constructed.
    #[error("{0}")]
    Configuration(String),

    /// An operation invoked at a forbidden time, e.g. from inside a reducer.
    #[error("{0}")]
    InvariantViolation(String),

    /// A slice reducer failed the probe run while reducers were being combined.
    #[error("The slice reducer for key \"{key}\" {message}")]
    Shape { key: String, message: String },

    /// A slice reducer returned undefined during a live dispatch.
    #[error(
        "When called with {}, the slice reducer for key \"{key}\" returned undefined. \
         To ignore an action, you must explicitly return the previous state. \
         If you want this reducer to hold no value, you can return null instead of undefined.",
        describe_action(.action_type)
    )]
    State {
        key: String,
        action_type: Option<String>,
    },

    /// A typed action could not be turned into an action record.
    #[error("failed to serialize action: {0}")]
    Serialization(#[source] Arc<serde_json::Error>),
}

impl StoreError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Whether this is a [`StoreError::Configuration`]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is a [`StoreError::InvariantViolation`]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

fn describe_action(action_type: &Option<String>) -> String {
    match action_type {
        Some(ty) => format!("action type \"{ty}\""),
        None => "an action".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_names_key_and_action() {
        let err = StoreError::State {
            key: "todos".into(),
            action_type: Some("todos/add".into()),
        };
        let message = err.to_string();
        assert!(message.contains("key \"todos\""));
        assert!(message.contains("action type \"todos/add\""));
    }

    #[test]
    fn test_state_error_without_type() {
        let err = StoreError::State {
            key: "a".into(),
            action_type: None,
        };
        assert!(err.to_string().starts_with("When called with an action,"));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(StoreError::configuration("x").is_configuration());
        assert!(StoreError::invariant("x").is_invariant_violation());
        assert!(!StoreError::invariant("x").is_configuration());
    }
}
