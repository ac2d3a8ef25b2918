use std::fmt;

use thiserror::Error;

/// High-level error type shared across dyninclude components.
#[derive(Debug, Error)]
pub enum DynincludeError {
    #[error("content error: {0}")]
    Content(String),
    #[error("placeholder error: {0}")]
    Placeholder(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DynincludeError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            DynincludeError::Content(msg) => DynincludeError::Content(format!("{ctx}: {msg}")),
            DynincludeError::Placeholder(msg) => {
                DynincludeError::Placeholder(format!("{ctx}: {msg}"))
            }
            DynincludeError::Io(err) => DynincludeError::Io(err),
        }
    }
}
