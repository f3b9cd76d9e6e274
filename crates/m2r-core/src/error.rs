use std::fmt;

use thiserror::Error;

/// The call argument a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    X,
    Y,
    /// Destination of an assign call.
    Output,
    /// The combining function, checked only at the C boundary.
    Callback,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::X => write!(f, "x"),
            Argument::Y => write!(f, "y"),
            Argument::Output => write!(f, "output"),
            Argument::Callback => write!(f, "callback"),
        }
    }
}

/// Why an argument failed capability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeMismatchKind {
    /// Neither a flat buffer nor a shaped view.
    NotArrayLike,
    /// One operand is flat and the other shaped.
    MixedCategories,
    /// A null function pointer at the C boundary.
    NotCallable,
}

impl fmt::Display for TypeMismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeMismatchKind::NotArrayLike => {
                write!(f, "must be either a flat array or a shaped view")
            }
            TypeMismatchKind::MixedCategories => write!(
                f,
                "all array arguments must be either flat arrays or shaped views"
            ),
            TypeMismatchKind::NotCallable => write!(f, "must be a function"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("invalid argument `{argument}`: {kind}")]
    TypeMismatch {
        argument: Argument,
        kind: TypeMismatchKind,
    },
    #[error("length mismatch for `{argument}`: expected {expected}, got {got}")]
    LengthMismatch {
        argument: Argument,
        expected: usize,
        got: usize,
    },
    #[error("cannot broadcast shapes {x:?} and {y:?}: dimension {dim} has sizes {x_dim} and {y_dim}")]
    BroadcastIncompatible {
        x: Vec<usize>,
        y: Vec<usize>,
        dim: usize,
        x_dim: usize,
        y_dim: usize,
    },
    #[error("invalid view: {0}")]
    InvalidView(String),
    #[error("unknown memory order: {0}")]
    UnknownOrder(String),
}

impl MapError {
    pub(crate) fn type_mismatch(argument: Argument, kind: TypeMismatchKind) -> Self {
        MapError::TypeMismatch { argument, kind }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
