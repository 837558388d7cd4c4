//! Error types for walkmod-edit.
//!
//! This module distinguishes between:
//! - User errors (exit code 2): schema violations, unparsable documents,
//!   malformed identifiers, documents required but missing
//! - Runtime errors (exit code 1): I/O and everything else

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use walkmod_types::IdentifierError;

/// The top-level error type for document loading, editing and persistence.
#[derive(Debug, Error)]
pub enum EditError {
    /// The document does not have the structure its format requires.
    #[error("schema violation in {path}: {message}")]
    Schema { path: Utf8PathBuf, message: String },

    /// The document text could not be parsed at all.
    #[error("cannot parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    /// A plugin or provider identifier was rejected before any edit.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// A read-only operation required a document that does not exist.
    #[error("configuration file not found: {0}")]
    MissingDocument(Utf8PathBuf),

    /// A runtime/tool error occurred (exit code 1).
    #[error("runtime error: {0:#}")]
    Runtime(#[from] anyhow::Error),
}

impl EditError {
    pub fn schema(path: &Utf8Path, message: impl Into<String>) -> Self {
        EditError::Schema {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn parse(path: &Utf8Path, message: impl std::fmt::Display) -> Self {
        EditError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Returns true if the error is caused by the input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, EditError::Runtime(_))
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_user_error() { 2 } else { 1 }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_reports_exit_code_2() {
        let err = EditError::schema(Utf8Path::new("walkmod.xml"), "reader requires 'path'");
        assert!(err.is_user_error());
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "schema violation in walkmod.xml: reader requires 'path'"
        );
    }

    #[test]
    fn runtime_error_reports_exit_code_1() {
        let err = EditError::from(anyhow::anyhow!("boom"));
        assert!(!err.is_user_error());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("runtime error"));
    }

    #[test]
    fn identifier_error_is_transparent() {
        let err = EditError::from(IdentifierError::Plugin("a:b".to_string()));
        assert_eq!(err.exit_code(), 2);
        let message = err.to_string();
        assert!(message.starts_with("malformed plugin identifier 'a:b'"));
    }
}
