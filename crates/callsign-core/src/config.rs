//! Optimizer configuration.

use crate::optimizer::passes::DEFAULT_PARAM_PREFIX;

/// How aggressively to rewrite. Levels are ordered; each pass declares the
/// lowest level it runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizationLevel {
    /// Run nothing.
    None,
    /// Local rewrites only (the arguments materializer).
    Standard,
    /// Whole-program rewrites (the call-site/signature co-optimizer).
    Aggressive,
}

/// Options for [`crate::Optimizer`].
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    pub level: OptimizationLevel,
    /// Prefix for parameter names the materializer synthesizes. The
    /// counter appended to it is global to a pass instance, so generated
    /// names never collide with each other; pick a prefix no ordinary
    /// source would use.
    pub param_prefix: String,
}

impl OptimizerOptions {
    pub fn with_level(level: OptimizationLevel) -> Self {
        OptimizerOptions {
            level,
            param_prefix: DEFAULT_PARAM_PREFIX.to_string(),
        }
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerOptions::with_level(OptimizationLevel::Aggressive)
    }
}
