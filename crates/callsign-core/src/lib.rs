//! Callsign core: whole-program signature optimization.
//!
//! The crate operates on the normalized script trees from `callsign-ast` and
//! rewrites function signatures together with every call site:
//!
//! - [`ArgumentsToParamsPass`] turns indexed reads of the implicit
//!   `arguments` collection into named parameter reads, growing parameter
//!   lists as needed.
//! - [`SignatureOptimizationPass`] removes trailing parameters no call site
//!   supplies and hoists call-site-invariant constant arguments into the
//!   callee.
//!
//! [`Optimizer`] runs the two in sequence under an [`OptimizationLevel`];
//! every mutation is reported to a [`ChangeLog`] keyed by enclosing function
//! scope.

pub mod changes;
pub mod config;
pub mod optimizer;
pub mod program;

pub use changes::ChangeLog;
pub use config::{OptimizationLevel, OptimizerOptions};
pub use optimizer::passes::{ArgumentsToParamsPass, SignatureOptimizationPass, DEFAULT_PARAM_PREFIX};
pub use optimizer::{OptimizeError, Optimizer, OptimizerPass, Result};
pub use program::{LifeCycleStage, Program};
