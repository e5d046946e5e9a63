//! The program under optimization.

use callsign_ast::Tree;
use rustc_hash::FxHashSet;

/// Where the program is in the compilation pipeline.
///
/// Both passes require `Normalized`: unique binding names program-wide and
/// one declarator per `var` statement. Normalization itself happens
/// upstream; running a pass on a `Raw` program is a precondition violation
/// and fails without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeCycleStage {
    Raw,
    Normalized,
}

impl LifeCycleStage {
    pub fn is_normalized(self) -> bool {
        self == LifeCycleStage::Normalized
    }
}

/// A tree plus the whole-program facts the passes need: the lifecycle
/// stage and the qualified names the host environment declares or reaches.
pub struct Program {
    pub tree: Tree,
    externs: FxHashSet<String>,
    stage: LifeCycleStage,
}

impl Program {
    pub fn new(tree: Tree) -> Self {
        Program {
            tree,
            externs: FxHashSet::default(),
            stage: LifeCycleStage::Raw,
        }
    }

    /// Wraps a tree the caller guarantees is already normalized.
    pub fn normalized(tree: Tree) -> Self {
        let mut program = Program::new(tree);
        program.stage = LifeCycleStage::Normalized;
        program
    }

    pub fn stage(&self) -> LifeCycleStage {
        self.stage
    }

    pub fn mark_normalized(&mut self) {
        self.stage = LifeCycleStage::Normalized;
    }

    /// Declares a qualified name as visible to the host environment.
    /// Definitions of extern-visible names are never rewritten.
    pub fn declare_extern(&mut self, name: &str) {
        self.externs.insert(name.to_string());
    }

    pub fn is_extern(&self, name: &str) -> bool {
        self.externs.contains(name)
    }
}
