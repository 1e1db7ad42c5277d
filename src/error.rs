//! Error types for fragkey
//!
//! All modules use `FragkeyResult<T>` as their return type.

use crate::options::OptionsError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fragkey operations
pub type FragkeyResult<T> = Result<T, FragkeyError>;

/// All errors that can occur in fragkey
#[derive(Error, Debug)]
pub enum FragkeyError {
    // Fragment type errors
    #[error("Couldn't resolve fragment type: {name}")]
    UnresolvedFragmentType { name: String },

    #[error("Fragment type not registered: {0}")]
    FragmentNotRegistered(String),

    #[error("Fragment type registered twice: {0}")]
    DuplicateFragmentType(String),

    #[error("Invalid fragment type name: {0:?}")]
    InvalidFragmentName(String),

    // Option set errors, surfaced unchanged from the collaborator
    #[error(transparent)]
    Options(#[from] OptionsError),

    // Codec errors
    #[error("Failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("Failed to encode {context}: {reason}")]
    Encode { context: String, reason: String },

    #[error("Unexpected {0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    #[error("Missing injected dependency: {0}")]
    MissingDependency(&'static str),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FragkeyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a decoding error for the named wire element
    pub fn decode(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an encoding error for the named wire element
    pub fn encode(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    ///
    /// Nothing in this crate retries; the flag is advice for the host engine.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnresolvedFragmentType { .. } => {
                Some("Register the fragment type with the resolver used for deserialization")
            }
            Self::FragmentNotRegistered(_) => {
                Some("Add a [[fragments]] entry naming the option categories it reads")
            }
            Self::MissingDependency(_) => {
                Some("Insert the dependency into the DeserializationContext before decoding")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FragkeyError::UnresolvedFragmentType {
            name: "cpp".to_string(),
        };
        assert_eq!(err.to_string(), "Couldn't resolve fragment type: cpp");
    }

    #[test]
    fn error_hint() {
        let err = FragkeyError::FragmentNotRegistered("java".to_string());
        assert!(err.hint().unwrap().contains("[[fragments]]"));
        assert_eq!(FragkeyError::TrailingBytes(3).hint(), None);
    }

    #[test]
    fn error_retryable() {
        let io = FragkeyError::io(
            "reading config",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        );
        assert!(io.is_retryable());
        assert!(!FragkeyError::TrailingBytes(1).is_retryable());
    }

    #[test]
    fn options_error_is_transparent() {
        let err: FragkeyError = OptionsError::MissingCategory("cpp".to_string()).into();
        assert_eq!(
            err.to_string(),
            OptionsError::MissingCategory("cpp".to_string()).to_string()
        );
    }
}
