//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::catalog::ParamKind;
use crate::domain::node::NodePath;

/// Domain errors describe malformed formula trees.
/// All of them are deterministic for a given input tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown operation `{name}` at {path}")]
    UnknownOperation { name: String, path: NodePath },

    #[error("missing parameter `{parameter}` for `{operation}` at {path}")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
        path: NodePath,
    },

    #[error("unknown parameter `{parameter}` for `{operation}` at {path}")]
    UnknownParameter {
        operation: &'static str,
        parameter: String,
        path: NodePath,
    },

    #[error("parameter `{parameter}` for `{operation}` given more than once at {path}")]
    DuplicateParameter {
        operation: &'static str,
        parameter: &'static str,
        path: NodePath,
    },

    #[error("parameter `{parameter}` for `{operation}` must be a {expected}, found {found} at {path}")]
    BadParameterKind {
        operation: &'static str,
        parameter: &'static str,
        expected: ParamKind,
        found: &'static str,
        path: NodePath,
    },

    #[error("invalid index letter `{letter}` for `{operation}` at {path}")]
    InvalidIndexLetter {
        operation: &'static str,
        letter: String,
        path: NodePath,
    },

    #[error("invalid root operation `{operation}` at {path}: {reason}")]
    InvalidRootOperation {
        operation: String,
        path: NodePath,
        reason: &'static str,
    },

    #[error("unbound variable `{name}` at {path}")]
    UnboundVariableReference { name: String, path: NodePath },

    #[error("recursion limit of {limit} exceeded at {path}")]
    RecursionLimitExceeded { limit: usize, path: NodePath },

    #[error("malformed node at {path}: {reason}")]
    MalformedNode { path: NodePath, reason: String },
}

impl DomainError {
    /// Path of the node that caused the error.
    pub fn path(&self) -> &NodePath {
        match self {
            DomainError::UnknownOperation { path, .. }
            | DomainError::MissingParameter { path, .. }
            | DomainError::UnknownParameter { path, .. }
            | DomainError::DuplicateParameter { path, .. }
            | DomainError::BadParameterKind { path, .. }
            | DomainError::InvalidIndexLetter { path, .. }
            | DomainError::InvalidRootOperation { path, .. }
            | DomainError::UnboundVariableReference { path, .. }
            | DomainError::RecursionLimitExceeded { path, .. }
            | DomainError::MalformedNode { path, .. } => path,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
