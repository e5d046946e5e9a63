// =============================================================================
// O3: Call-Site and Signature Co-Optimization
// =============================================================================
//
// Rewrites function signatures together with every call site, using the
// whole-program def/use index. Two rewrites, attempted in order per function:
//
// 1. Constant-argument elimination: an argument position whose expression is
//    structurally identical and movable at every call site is deleted from
//    the sites and re-bound as a `var` at the top of the callee.
// 2. Trailing-optional elimination: formal parameters past the largest
//    argument count any site supplies are deleted and re-declared as
//    uninitialized `var`s, keeping internal writes to them legal.
//
// Safety constraints:
// - Only functions whose every reference is a direct call or `new` site are
//   touched; any aliasing use (passed as a value, read through a property,
//   `.apply`) disqualifies the function
// - A name with more than one reachable definition is never rewritten, nor
//   is a definition visible to the host environment (externs)
// - Functions that read the implicit `arguments` collection keep their
//   signature: positional indexes into it would silently shift
// - Hoisting an argument moves its evaluation after the arguments that stay
//   at the call site, so a backward scan un-marks any candidate that could
//   observe or produce effects around a kept later position
//
// Example transformation:
//   function f(a, b) { use(a, b); }
//   f(computeStep(), 1);
//   f(computeStep(), 1);
// →
//   function f(a) { var b = 1; use(a, b); }
//   f(computeStep());
//   f(computeStep());

use callsign_ast::{
    can_be_side_effected, is_immutable_value, may_have_side_effects, NodeId, SideEffectFlags,
    StringId, Token, Tree,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::changes::ChangeLog;
use crate::config::OptimizationLevel;
use crate::optimizer::analysis::{
    is_call_or_new_site, BindingScope, DefUseIndex, Definition, DefinitionId, DefinitionKind,
};
use crate::optimizer::error::{OptimizeError, Result};
use crate::optimizer::OptimizerPass;
use crate::program::Program;

/// Helpers whose argument order encodes a subclass relationship. Reordering
/// or removing their arguments would corrupt the class graph.
static INHERITANCE_HELPERS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["$cs.inherits", "$cs$inherits"].into_iter().collect());

/// Per-position view of a call signature while one function is being
/// optimized. `arg` is the expression from the first call site; the
/// side-effect bits accumulate over every site's expression at the position.
struct Parameter {
    arg: NodeId,
    should_remove: bool,
    has_side_effects: bool,
    can_be_side_effected: bool,
}

impl Parameter {
    fn describe(tree: &Tree, arg: NodeId, should_remove: bool) -> Self {
        Self {
            arg,
            should_remove,
            has_side_effects: may_have_side_effects(tree, arg),
            can_be_side_effected: can_be_side_effected(tree, arg),
        }
    }

    fn absorb(&mut self, tree: &Tree, arg: NodeId) {
        self.has_side_effects |= may_have_side_effects(tree, arg);
        self.can_be_side_effected |= can_be_side_effected(tree, arg);
    }
}

/// Removes never-supplied trailing parameters and hoists always-identical
/// movable arguments into the callee.
pub struct SignatureOptimizationPass;

impl SignatureOptimizationPass {
    pub fn new() -> Self {
        Self
    }

    /// Runs against a caller-provided index. The index must have been built
    /// from `program` in its current state.
    pub fn run_with_index(
        &mut self,
        program: &mut Program,
        changes: &mut ChangeLog,
        index: &mut DefUseIndex,
    ) -> Result<bool> {
        if !program.stage().is_normalized() {
            return Err(OptimizeError::NotNormalized { pass: self.name() });
        }
        // Rewrites shrink the use-site tables as they go; the definition set
        // itself is fixed up front.
        let definitions: Vec<DefinitionId> = index.definition_ids().collect();
        let mut changed = false;
        for id in definitions {
            if !can_change_signature(program, index, id) {
                continue;
            }
            let removed_constants =
                try_eliminate_constant_args(&mut program.tree, changes, index, id);
            let removed_optionals =
                try_eliminate_optional_args(&mut program.tree, changes, index, id);
            if removed_constants || removed_optionals {
                changed = true;
                debug!("optimized signature of {}", index.definition(id).simplified_name());
            }
        }
        Ok(changed)
    }
}

impl Default for SignatureOptimizationPass {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerPass for SignatureOptimizationPass {
    fn name(&self) -> &'static str {
        "signature-optimization"
    }

    fn min_level(&self) -> OptimizationLevel {
        OptimizationLevel::Aggressive
    }

    fn run(&mut self, program: &mut Program, changes: &mut ChangeLog) -> Result<bool> {
        let mut index = DefUseIndex::build(program);
        self.run_with_index(program, changes, &mut index)
    }
}

/// Whether every reference to `id` is under this pass's control. All of the
/// conditions are conservative: failing any one leaves the function alone.
fn can_change_signature(program: &Program, index: &DefUseIndex, id: DefinitionId) -> bool {
    let tree = &program.tree;
    let def = index.definition(id);
    if def.in_externs {
        return false;
    }
    if tree.kind(def.function) != Token::Function {
        return false;
    }
    if uses_arguments_collection(tree, def.function) {
        return false;
    }
    if let Some(qualified) = tree.qualified_name(def.lvalue) {
        if INHERITANCE_HELPERS.contains(qualified.as_str()) {
            return false;
        }
    }
    if !is_simple_function_declaration(tree, def) {
        return false;
    }
    if !index.can_modify(id) {
        return false;
    }
    let sites = index.use_sites(id);
    if sites.is_empty() {
        return false;
    }
    sites.iter().all(|&site| {
        is_call_or_new_site(tree, site)
            && index.definitions_referenced_at(tree, site).len() <= 1
    })
}

/// Whether the function body references the implicit `arguments` collection.
/// Nested non-arrow functions rebind the collection and are skipped; arrow
/// bodies read the enclosing one and count.
fn uses_arguments_collection(tree: &Tree, function: NodeId) -> bool {
    let Some(arguments_id) = tree.interner().get("arguments") else {
        return false;
    };
    let Some(body) = tree.function_body(function) else {
        return false;
    };
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        match tree.kind(node) {
            Token::Name if tree.name_of(node) == Some(arguments_id) => return true,
            Token::Function if !tree.is_arrow_function(node) => {}
            _ => stack.extend_from_slice(tree.children(node)),
        }
    }
    false
}

/// A definition qualifies only when it executes unconditionally at
/// statement level. Object-literal slots and nested right-hand sides are
/// rejected.
fn is_simple_function_declaration(tree: &Tree, def: &Definition) -> bool {
    let function = def.function;
    match def.kind {
        DefinitionKind::Declaration => matches!(
            tree.parent(function).map(|p| tree.kind(p)),
            Some(Token::Script | Token::Block)
        ),
        DefinitionKind::VarInitializer => tree
            .parent(function)
            .and_then(|var| tree.parent(var))
            .map(|p| matches!(tree.kind(p), Token::Script | Token::Block))
            .unwrap_or(false),
        DefinitionKind::Assignment => tree
            .parent(function)
            .and_then(|assign| tree.parent(assign))
            .map(|p| tree.kind(p) == Token::ExprResult)
            .unwrap_or(false),
        DefinitionKind::ObjectLiteralKey => false,
    }
}

/// Hoists arguments that are structurally identical and movable at every
/// call site into the callee. Returns whether anything was rewritten.
fn try_eliminate_constant_args(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    id: DefinitionId,
) -> bool {
    let function = index.definition(id).function;
    let sites: Vec<NodeId> = index.use_sites(id).to_vec();
    let Some((&first, rest)) = sites.split_first() else {
        return false;
    };
    let Some(mut parameters) = build_parameter_list(tree, first) else {
        return false;
    };
    for &site in rest {
        if !find_fixed_parameters(tree, &mut parameters, site) {
            return false;
        }
    }
    if !adjust_for_side_effects(&mut parameters) {
        return false;
    }
    for &site in &sites {
        optimize_call_site(tree, changes, index, &parameters, site);
    }
    optimize_function_definition(tree, changes, index, function, &parameters);
    true
}

/// Seeds the parameter list from the first call site. A position starts as a
/// removal candidate iff its expression could be evaluated in the callee
/// instead. Returns `None` when no position qualifies.
fn build_parameter_list(tree: &Tree, site: NodeId) -> Option<Vec<Parameter>> {
    let call = tree.parent(site)?;
    let scope = BindingScope::at(tree, site);
    let arguments_id = tree.interner().get("arguments");
    let mut any_movable = false;
    let mut parameters = Vec::new();
    for &arg in tree.children(call).iter().skip(1) {
        let movable = is_movable_value(tree, &scope, arguments_id, arg);
        any_movable |= movable;
        parameters.push(Parameter::describe(tree, arg, movable));
    }
    if any_movable {
        Some(parameters)
    } else {
        None
    }
}

/// Folds one more call site into the parameter list: candidates survive only
/// where this site supplies a structurally equivalent expression, and every
/// position this site does not supply stops being a candidate. Returns
/// whether any candidate is still alive.
fn find_fixed_parameters(tree: &Tree, parameters: &mut Vec<Parameter>, site: NodeId) -> bool {
    let Some(call) = tree.parent(site) else {
        return false;
    };
    let args: Vec<NodeId> = tree.children(call).iter().skip(1).copied().collect();
    let mut any_movable = false;
    for (position, &arg) in args.iter().enumerate() {
        if position >= parameters.len() {
            parameters.push(Parameter::describe(tree, arg, false));
        } else {
            let p = &mut parameters[position];
            if p.should_remove {
                if tree.equivalent(arg, p.arg) {
                    any_movable = true;
                } else {
                    p.should_remove = false;
                }
            }
            p.absorb(tree, arg);
        }
    }
    for p in parameters.iter_mut().skip(args.len()) {
        p.should_remove = false;
    }
    any_movable
}

/// Whether `node` evaluates to the same value inside the callee as at the
/// call site. `this`, function literals, the `arguments` collection, and
/// names bound locally at the call site pin an expression to its position;
/// globals, literals, and compositions of those move freely (evaluation
/// order is the next check's problem).
fn is_movable_value(
    tree: &Tree,
    scope: &BindingScope,
    arguments_id: Option<StringId>,
    node: NodeId,
) -> bool {
    match tree.kind(node) {
        Token::This | Token::Function => return false,
        Token::Name => match tree.name_of(node) {
            Some(id) if Some(id) == arguments_id => return false,
            Some(id) if scope.is_local(id) => return false,
            Some(_) => {}
            None => return false,
        },
        _ => {}
    }
    tree.children(node)
        .iter()
        .all(|&child| is_movable_value(tree, scope, arguments_id, child))
}

/// Backward scan preserving evaluation order. Hoisting moves a position's
/// evaluation after every later position that stays at the call site, so a
/// candidate dies if it has side effects a kept later position could
/// observe, or could observe a kept later position's side effects. Kept
/// earlier positions still evaluate first and never conflict. Returns
/// whether any candidate survived.
fn adjust_for_side_effects(parameters: &mut [Parameter]) -> bool {
    let mut any_movable = false;
    let mut kept_side_effects_seen = false;
    let mut kept_side_effected_seen = false;
    for p in parameters.iter_mut().rev() {
        if p.should_remove
            && ((kept_side_effects_seen && p.can_be_side_effected)
                || (kept_side_effected_seen && p.has_side_effects))
        {
            p.should_remove = false;
        }
        if p.should_remove {
            any_movable = true;
        } else {
            kept_side_effects_seen |= p.has_side_effects;
            kept_side_effected_seen |= p.can_be_side_effected;
        }
    }
    any_movable
}

/// Deletes removed positions from one call site, highest first. A call that
/// mutates its arguments but not global state gets its flags widened when a
/// mutable value is hoisted out of it: the mutation now reaches a value that
/// outlives the call.
fn optimize_call_site(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    parameters: &[Parameter],
    site: NodeId,
) {
    let Some(call) = tree.parent(site) else {
        return;
    };
    let may_mutate_args = tree.may_mutate_arguments(call);
    let may_mutate_global_or_throw = tree.may_mutate_global_state_or_throw(call);
    for (position, p) in parameters.iter().enumerate().rev() {
        if !p.should_remove {
            continue;
        }
        eliminate_call_arg_at(tree, changes, index, p, call, position);
        if may_mutate_args && !may_mutate_global_or_throw && !is_immutable_value(tree, p.arg) {
            let flags = tree.side_effect_flags(call) | SideEffectFlags::MUTATES_GLOBAL_STATE;
            tree.set_side_effect_flags(call, flags);
        }
    }
}

fn eliminate_call_arg_at(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    p: &Parameter,
    call: NodeId,
    position: usize,
) {
    let Some(arg) = tree.child(call, position + 1) else {
        return;
    };
    changes.report_change_to_enclosing_scope(tree, arg);
    // The first site's expression moves into the callee and keeps its
    // references; duplicates from other sites are dropped for good.
    if arg != p.arg {
        index.remove_references(tree, arg);
    }
    tree.remove_child(call, arg);
}

/// Deletes removed positions from the signature, highest first, re-binding
/// each hoisted expression at the top of the body. Prepending in descending
/// position order leaves the bindings in ascending order, so they evaluate
/// left to right exactly as the call site did.
fn optimize_function_definition(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    function: NodeId,
    parameters: &[Parameter],
) {
    for (position, p) in parameters.iter().enumerate().rev() {
        if !p.should_remove {
            continue;
        }
        let name = eliminate_function_param_at(tree, changes, index, function, position);
        add_variable_to_function(tree, changes, function, name, p.arg);
    }
}

fn eliminate_function_param_at(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    function: NodeId,
    position: usize,
) -> Option<StringId> {
    let params = tree.function_params(function)?;
    let param = tree.child(params, position)?;
    changes.report_change_to_enclosing_scope(tree, param);
    index.remove_references(tree, param);
    tree.remove_child(params, param);
    tree.name_of(param)
}

/// Prepends `var <name> = <value>;` to the body, or a bare expression
/// statement when the position had no formal (the value's effects must
/// still happen once per call).
fn add_variable_to_function(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    function: NodeId,
    name: Option<StringId>,
    value: NodeId,
) {
    let Some(body) = tree.function_body(function) else {
        return;
    };
    debug_assert!(tree.parent(value).is_none(), "hoisted value still attached");
    let span = tree.span(value);
    let stmt = match name {
        Some(name) => tree.var_decl_from_id(name, Some(value)),
        None => tree.expr_result(value),
    };
    tree.set_span(stmt, span);
    tree.prepend_child(body, stmt);
    changes.report_change_to_enclosing_scope(tree, stmt);
}

/// Trims formal parameters no call site ever supplies. Each removed formal
/// is re-declared as an uninitialized `var` so writes to it inside the body
/// stay valid. Call sites are untouched.
fn try_eliminate_optional_args(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    id: DefinitionId,
) -> bool {
    let function = index.definition(id).function;
    let mut max_args = 0;
    for &site in index.use_sites(id) {
        let Some(call) = tree.parent(site) else {
            continue;
        };
        max_args = max_args.max(tree.child_count(call).saturating_sub(1));
    }
    eliminate_params_after(tree, changes, index, function, max_args)
}

fn eliminate_params_after(
    tree: &mut Tree,
    changes: &mut ChangeLog,
    index: &mut DefUseIndex,
    function: NodeId,
    max_args: usize,
) -> bool {
    let Some(params) = tree.function_params(function) else {
        return false;
    };
    let Some(body) = tree.function_body(function) else {
        return false;
    };
    let count = tree.child_count(params);
    if max_args >= count {
        return false;
    }
    for position in (max_args..count).rev() {
        let Some(param) = tree.child(params, position) else {
            continue;
        };
        changes.report_change_to_enclosing_scope(tree, param);
        index.remove_references(tree, param);
        tree.remove_child(params, param);
        if let Some(name) = tree.name_of(param) {
            let decl = tree.var_decl_from_id(name, None);
            tree.set_span(decl, tree.span(param));
            tree.prepend_child(body, decl);
            changes.report_change_to_enclosing_scope(tree, decl);
        }
    }
    true
}
