//! Pipeline-running helpers for optimizer tests.

use callsign_ast::Tree;
use callsign_core::{
    ArgumentsToParamsPass, ChangeLog, OptimizationLevel, Optimizer, OptimizerOptions,
    OptimizerPass, Program, SignatureOptimizationPass,
};

/// Wraps a finished tree in a program marked normalized, the stage every
/// pass requires.
pub fn normalized_program(tree: Tree) -> Program {
    Program::normalized(tree)
}

/// Runs the full pipeline at `Aggressive`.
///
/// # Returns
/// Whether anything changed, plus the change log.
pub fn optimize(program: &mut Program) -> (bool, ChangeLog) {
    optimize_at(program, OptimizationLevel::Aggressive)
}

/// Runs the full pipeline at the given level.
pub fn optimize_at(program: &mut Program, level: OptimizationLevel) -> (bool, ChangeLog) {
    let mut changes = ChangeLog::new();
    let optimizer = Optimizer::new(OptimizerOptions::with_level(level));
    let changed = optimizer
        .optimize(program, &mut changes)
        .expect("optimizer failed");
    (changed, changes)
}

/// Runs only the `arguments`-to-parameters materializer.
pub fn materialize_arguments(program: &mut Program) -> (bool, ChangeLog) {
    run_pass(&mut ArgumentsToParamsPass::new(), program)
}

/// Runs only the call-site/signature co-optimizer.
pub fn optimize_signatures(program: &mut Program) -> (bool, ChangeLog) {
    run_pass(&mut SignatureOptimizationPass::new(), program)
}

/// Runs a single pass to completion.
pub fn run_pass(pass: &mut dyn OptimizerPass, program: &mut Program) -> (bool, ChangeLog) {
    let mut changes = ChangeLog::new();
    let changed = pass.run(program, &mut changes).expect("pass failed");
    (changed, changes)
}

/// Dumps the whole program tree as its S-expression form.
pub fn dump(program: &Program) -> String {
    program.tree.dump(program.tree.root())
}
