//! Signature-rewriting optimization passes.
//!
//! Both passes assume a normalized program and report every mutation to the
//! shared [`ChangeLog`](crate::changes::ChangeLog). `O2` materializes the
//! implicit `arguments` collection into named parameters so that `O3` can
//! co-optimize call sites and signatures with full knowledge of a function's
//! inputs.

pub mod arguments_to_params;
pub mod signature_optimization;

pub use arguments_to_params::{ArgumentsToParamsPass, DEFAULT_PARAM_PREFIX};
pub use signature_optimization::SignatureOptimizationPass;
