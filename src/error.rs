//! Crate error types

use thiserror::Error;

use crate::host::{err_occurred, exception_message, type_name};

/// A host call failed and left an exception in the error indicator
///
/// The indicator is not cleared; the exception stays pending for whoever
/// handles it next, exactly as with the raw catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompatError {
    #[error("{type_name}: {message}")]
    Raised { type_name: String, message: String },

    #[error("error return without exception set")]
    NoException,
}

impl CompatError {
    /// Describe the pending exception of the current thread
    pub fn from_indicator() -> Self {
        let exc = err_occurred();
        if exc.is_null() {
            return CompatError::NoException;
        }
        unsafe {
            CompatError::Raised {
                type_name: type_name(exc).to_string(),
                message: exception_message(exc).to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CompatError>;
