//! Error types for event registration and dispatch.

use thiserror::Error;

/// Errors that can occur while binding, registering or invoking listeners.
///
/// Resolution failures (a method that cannot be found) are not errors: they
/// surface as `None`/`Ok(false)` so a partially broken event still fires its
/// remaining listeners.
#[derive(Debug, Error)]
pub enum EventError {
    /// A required target or method was missing at bind time.
    #[error("Null argument: {0}")]
    NullArgument(&'static str),

    /// `invoke` was called with the wrong number of arguments.
    #[error("Passed argument 'args' is invalid size. Expected size is {expected}, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// An argument could not be converted to the declared parameter type.
    #[error("Passed argument {index} is not assignable to {expected}")]
    ArgumentType { index: usize, expected: &'static str },

    /// The bound method does not have the arity the call expects.
    #[error("Method {method} takes {actual} parameters, expected {expected}")]
    SignatureMismatch {
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The bound method declares a parameter the call cannot pass.
    #[error("Method {method} takes {declared} as parameter {index}, the call passes {passed}")]
    ParameterMismatch {
        method: &'static str,
        index: usize,
        declared: &'static str,
        passed: &'static str,
    },

    /// Persistent listeners always bind to an instance.
    #[error("Could not register listener {0}: static functions are not supported")]
    StaticListener(String),

    /// The listener target is null, destroyed or not a host object.
    #[error("Could not register callback {method} on {target}: target is not a live object")]
    InvalidTarget { method: String, target: String },

    /// A persistent listener index was out of range.
    #[error("Persistent listener index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// A method handle was called with a target of the wrong type.
    #[error("Target is not an instance of {0}")]
    TargetType(&'static str),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
