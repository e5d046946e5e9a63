//! Whole-program optimizer infrastructure.
//!
//! The optimizer runs a fixed sequence of passes over a [`Program`], gated by
//! the configured [`OptimizationLevel`]. Passes implement [`OptimizerPass`]
//! and report both a changed flag and fine-grained change notifications, so
//! callers know which function scopes need re-analysis.

pub mod analysis;
pub mod error;
pub mod passes;

pub use error::{OptimizeError, Result};

use tracing::debug;

use crate::changes::ChangeLog;
use crate::config::{OptimizationLevel, OptimizerOptions};
use crate::program::Program;
use passes::{ArgumentsToParamsPass, SignatureOptimizationPass};

/// A single whole-program rewrite over a normalized tree.
pub trait OptimizerPass {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Lowest optimization level at which this pass runs.
    fn min_level(&self) -> OptimizationLevel;

    /// Runs the pass, returning whether the tree changed.
    fn run(&mut self, program: &mut Program, changes: &mut ChangeLog) -> Result<bool>;
}

/// Drives the pass pipeline in its fixed order.
pub struct Optimizer {
    options: OptimizerOptions,
}

impl Optimizer {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Runs every pass enabled at the configured level, in pipeline order.
    /// Returns whether any pass changed the program.
    pub fn optimize(&self, program: &mut Program, changes: &mut ChangeLog) -> Result<bool> {
        let mut passes: Vec<Box<dyn OptimizerPass>> = vec![
            Box::new(ArgumentsToParamsPass::with_prefix(
                self.options.param_prefix.clone(),
            )),
            Box::new(SignatureOptimizationPass::new()),
        ];

        let mut changed = false;
        for pass in &mut passes {
            if pass.min_level() > self.options.level {
                debug!("pass {} skipped below the configured level", pass.name());
                continue;
            }
            let pass_changed = pass.run(program, changes)?;
            debug!("pass {} finished (changed: {})", pass.name(), pass_changed);
            changed |= pass_changed;
        }
        Ok(changed)
    }
}
