//! Context helpers for attaching a message to lower-level errors.

use super::{Result, TriageError};

/// Extension trait adding context to any `Result` with a std error.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed context message.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::WithContext` if the underlying result is an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::WithContext` if the underlying result is an error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| TriageError::WithContext {
            context: context.into(),
            source: Box::new(source),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| TriageError::WithContext {
            context: f().into(),
            source: Box::new(source),
        })
    }
}

/// Extension trait turning a missing value into a `TriageError`.
pub trait OptionExt<T> {
    /// Convert `None` into the error built by `f`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f` when the option is `None`.
    fn ok_or_triage<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> TriageError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_triage<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> TriageError,
    {
        self.ok_or_else(f)
    }
}
