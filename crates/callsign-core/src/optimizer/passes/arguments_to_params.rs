// =============================================================================
// O2: Arguments-to-Parameters Materialization
// =============================================================================
//
// Rewrites indexed reads of the implicit `arguments` collection into reads of
// named parameters, synthesizing fresh trailing parameters for indexes past
// the declared list. Turning the implicit collection into explicit formals
// lets later signature rewrites (O3) see every input a function consumes.
//
// Safety constraints:
// - All-or-nothing per function: a single access the pass cannot prove safe
//   aborts every rewrite in that function
// - Only `arguments[<non-negative integer literal>]` reads qualify; a bare
//   alias, `arguments.length`, a dynamic index, or a fractional/NaN index
//   leaves the whole function untouched
// - `arguments[k](...)` is never rewritten: the element read supplies the
//   receiver binding of the call, and a plain name read would not
// - Arrow functions do not rebind the collection, so accesses inside an
//   arrow belong to the nearest enclosing non-arrow function and are
//   rewritten (or aborted) with that function's batch
//
// Example transformation:
//   function f(a) { return arguments[0] + arguments[2]; }
// →
//   function f(a, p0, p1) { return a + p1; }
//
// The synthesized names carry a collision-proof prefix; the counter is shared
// across the whole run so nested functions never shadow each other's params.

use callsign_ast::{NodeId, StringId, Token, Tree};
use tracing::debug;

use crate::changes::ChangeLog;
use crate::config::OptimizationLevel;
use crate::optimizer::error::{OptimizeError, Result};
use crate::optimizer::OptimizerPass;
use crate::program::Program;

/// Prefix for synthesized parameter names. Unusual on purpose: nothing in
/// user code should ever collide with it.
pub const DEFAULT_PARAM_PREFIX: &str = "Callsign_ArgumentsToParams_p";

/// Largest index literal the pass will materialize a parameter for. Anything
/// above this is treated as unprovable and aborts the function.
const MAX_MATERIALIZED_INDEX: f64 = 65535.0;

/// Rewrites `arguments[i]` element reads into named parameter reads,
/// growing the parameter list when an index has no formal yet.
pub struct ArgumentsToParamsPass {
    param_prefix: String,
    /// Counter for synthesized names, shared across every function in the
    /// run so the names are unique program-wide.
    next_unique_id: usize,
    /// Access list of the innermost non-arrow function currently being
    /// walked. `None` at the top level.
    current_accesses: Option<Vec<NodeId>>,
    changed: bool,
}

impl ArgumentsToParamsPass {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PARAM_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            param_prefix: prefix.into(),
            next_unique_id: 0,
            current_accesses: None,
            changed: false,
        }
    }

    fn walk(
        &mut self,
        tree: &mut Tree,
        changes: &mut ChangeLog,
        node: NodeId,
        arguments_id: StringId,
    ) -> Result<()> {
        match tree.kind(node) {
            Token::Function if !tree.is_arrow_function(node) => {
                let saved = self.current_accesses.take();
                self.current_accesses = Some(Vec::new());
                let kids = tree.children(node).to_vec();
                for child in kids {
                    self.walk(tree, changes, child, arguments_id)?;
                }
                let accesses = self.current_accesses.take().unwrap_or_default();
                self.try_replace_arguments(tree, changes, node, &accesses)?;
                self.current_accesses = saved;
            }
            Token::Name if tree.name_of(node) == Some(arguments_id) => {
                if let Some(accesses) = self.current_accesses.as_mut() {
                    accesses.push(node);
                }
            }
            _ => {
                let kids = tree.children(node).to_vec();
                for child in kids {
                    self.walk(tree, changes, child, arguments_id)?;
                }
            }
        }
        Ok(())
    }

    /// Validates every recorded access of `function` and, if all of them are
    /// provably safe element reads, rewrites them. Any unprovable access
    /// leaves the function untouched.
    fn try_replace_arguments(
        &mut self,
        tree: &mut Tree,
        changes: &mut ChangeLog,
        function: NodeId,
        accesses: &[NodeId],
    ) -> Result<()> {
        if accesses.is_empty() {
            return Ok(());
        }
        let params = tree.function_params(function).ok_or(OptimizeError::UnexpectedNode {
            expected: "function with a parameter list",
            found: tree.kind(function),
        })?;
        let num_params = tree.child_count(params);

        // Validation scan. Each entry of the plan is one rewrite:
        // (element read, its parent, validated index).
        let mut plan: Vec<(NodeId, NodeId, usize)> = Vec::with_capacity(accesses.len());
        let mut highest = num_params.saturating_sub(1);
        for &access in accesses {
            let Some(elem) = tree.parent(access) else {
                return Ok(());
            };
            if tree.kind(elem) != Token::GetElem || tree.first_child(elem) != Some(access) {
                return Ok(());
            }
            let index_value = match tree.second_child(elem).and_then(|n| tree.number_of(n)) {
                Some(value) => value,
                None => return Ok(()),
            };
            if index_value < 0.0
                || index_value.fract() != 0.0
                || index_value > MAX_MATERIALIZED_INDEX
            {
                return Ok(());
            }
            let Some(grand) = tree.parent(elem) else {
                return Ok(());
            };
            // `arguments[k](...)` reads the element as the call receiver.
            if tree.kind(grand) == Token::Call && tree.first_child(grand) == Some(elem) {
                return Ok(());
            }
            let index = index_value as usize;
            highest = highest.max(index);
            plan.push((elem, grand, index));
        }

        // Grow the signature for indexes past the declared parameters.
        let num_extra = highest + 1 - num_params;
        let mut new_names: Vec<StringId> = Vec::with_capacity(num_extra);
        if num_extra > 0 {
            let params_span = tree.span(params);
            for _ in 0..num_extra {
                let text = format!("{}{}", self.param_prefix, self.next_unique_id);
                self.next_unique_id += 1;
                let name_id = tree.intern(&text);
                let param = tree.name_from_id(name_id);
                tree.set_span(param, params_span);
                tree.append_child(params, param);
                new_names.push(name_id);
            }
            changes.report_change_to_enclosing_scope(tree, params);
            debug!(
                "materialized {} trailing parameter(s) in function {:?}",
                num_extra,
                tree.function_name(function).and_then(|n| tree.name_of(n))
            );
        }

        // Rewrite each element read into a plain name read.
        for (elem, grand, index) in plan {
            let name_id = if index < num_params {
                tree.child(params, index)
                    .and_then(|p| tree.name_of(p))
                    .ok_or(OptimizeError::UnexpectedNode {
                        expected: "named parameter",
                        found: tree.kind(params),
                    })?
            } else {
                new_names[index - num_params]
            };
            let span = tree.span(elem);
            let replacement = tree.name_from_id(name_id);
            tree.set_span(replacement, span);
            tree.replace_child(grand, elem, replacement);
            changes.report_change_to_enclosing_scope(tree, replacement);
            self.changed = true;
        }
        Ok(())
    }
}

impl Default for ArgumentsToParamsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerPass for ArgumentsToParamsPass {
    fn name(&self) -> &'static str {
        "arguments-to-params"
    }

    fn min_level(&self) -> OptimizationLevel {
        OptimizationLevel::Standard
    }

    fn run(&mut self, program: &mut Program, changes: &mut ChangeLog) -> Result<bool> {
        if !program.stage().is_normalized() {
            return Err(OptimizeError::NotNormalized { pass: self.name() });
        }
        self.changed = false;
        self.current_accesses = None;

        let arguments_id = program.tree.intern("arguments");
        let root = program.tree.root();
        self.walk(&mut program.tree, changes, root, arguments_id)?;

        debug_assert!(self.current_accesses.is_none());
        Ok(self.changed)
    }
}
