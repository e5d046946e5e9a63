//! Change notifications.
//!
//! Every logical rewrite the optimizer performs is reported once, scoped
//! to the nearest enclosing function of the mutated node (or the root for
//! top-level code). Downstream consumers use the log to invalidate
//! per-scope caches; entries are not deduplicated.

use callsign_ast::{NodeId, Tree};

#[derive(Default)]
pub struct ChangeLog {
    scopes: Vec<NodeId>,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog::default()
    }

    /// Records that the tree changed at `node`, attributed to the nearest
    /// enclosing function scope.
    pub fn report_change_to_enclosing_scope(&mut self, tree: &Tree, node: NodeId) {
        let scope = tree.enclosing_function(node).unwrap_or_else(|| tree.root());
        self.scopes.push(scope);
    }

    /// Changed scopes in report order.
    pub fn scopes(&self) -> &[NodeId] {
        &self.scopes
    }

    pub fn count_for(&self, scope: NodeId) -> usize {
        self.scopes.iter().filter(|&&s| s == scope).count()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}
