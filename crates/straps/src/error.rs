//! Realm errors
//!
//! Composition itself degrades silently (missing fields, bad aliases and
//! malformed accessor shapes are not errors). What remains is caller misuse
//! and failures raised by native functions that injection or construction
//! ends up running.

use thiserror::Error;

/// Errors produced by realm operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrapsError {
    /// A value was called that is not a function
    #[error("Not callable: {0}")]
    NotCallable(String),

    /// `construct` was given something other than a class
    #[error("Not constructible: {0}")]
    NotConstructible(String),

    /// `call_base` was used by a function that overrides nothing
    #[error("No base implementation for '{name}'")]
    NoBaseImplementation {
        /// Name of the calling function
        name: String,
    },

    /// Native calls nested deeper than `RealmOptions::max_call_depth`
    #[error("Maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    /// Fields were injected into a value that cannot hold fields
    #[error("Invalid injection target: {0}")]
    InvalidTarget(String),

    /// Realm options could not be parsed
    #[error("Invalid realm options: {0}")]
    Config(String),

    /// Error raised by a native function body
    #[error("{0}")]
    Native(String),
}

impl StrapsError {
    /// Convenience constructor for errors raised from native function bodies
    pub fn native(message: impl Into<String>) -> Self {
        StrapsError::Native(message.into())
    }
}

/// Result alias used throughout the crate
pub type StrapsResult<T> = Result<T, StrapsError>;
