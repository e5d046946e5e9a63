//! Optimizer error types.
//!
//! Only precondition and malformed-tree violations surface as errors.
//! A function the passes cannot analyze (dynamic index, aliased
//! definition, ambiguous call target) is silently left alone; that is a
//! normal outcome, not a failure.

use callsign_ast::Token;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptimizeError {
    /// The pass was handed a program that has not been normalized
    /// (unique names, single-declarator `var`s).
    #[error("pass `{pass}` requires a normalized program")]
    NotNormalized { pass: &'static str },

    /// A node did not have the child shape its kind promises.
    #[error("malformed tree: expected {expected}, found {found:?}")]
    UnexpectedNode {
        expected: &'static str,
        found: Token,
    },
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
