//! Integration tests for the arguments-to-parameters materializer.
//!
//! Tests build normalized script trees directly, run the pass, and compare
//! S-expression dumps of the rewritten program.

use callsign_ast::{Token, Tree};
use callsign_core::{ArgumentsToParamsPass, ChangeLog, OptimizeError, OptimizerPass, Program};
use callsign_test_helpers::{
    arguments_slot, dump, function_decl, materialize_arguments, normalized_program, run_pass,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Runs the pass with a short name prefix so expected dumps stay readable.
fn materialize(program: &mut Program) -> (bool, ChangeLog) {
    run_pass(&mut ArgumentsToParamsPass::with_prefix("p"), program)
}

// ── Basic materialization ────────────────────────────────────────────────────

#[test]
fn test_materializes_param_for_indexed_access() {
    // function f() { return arguments[0]; }
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    assert!(changed);
    assert_eq!(
        dump(&program),
        "(script (function (name f) (params (name p0)) (block (return (name p0)))))"
    );
}

#[test]
fn test_rewrites_access_to_existing_param() {
    // function f(a) { return arguments[0]; }
    // The read already has a formal; only the body changes.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let ret = tree.return_stmt(Some(access));
    let f = function_decl(&mut tree, "f", &["a"], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, changes) = materialize(&mut program);

    assert!(changed);
    assert_eq!(
        dump(&program),
        "(script (function (name f) (params (name a)) (block (return (name a)))))"
    );
    // No signature growth, so the only report is the replacement itself.
    assert_eq!(changes.len(), 1);
    assert_eq!(changes.count_for(f), 1);
}

#[test]
fn test_partial_coverage_pads_intermediate_params() {
    // function f(a) { return arguments[0] + arguments[2]; }
    // Index 2 forces a param for index 1 too, even though nothing reads it.
    let mut tree = Tree::new();
    let a0 = arguments_slot(&mut tree, 0.0);
    let a2 = arguments_slot(&mut tree, 2.0);
    let sum = tree.binary(Token::Add, a0, a2);
    let ret = tree.return_stmt(Some(sum));
    function_decl(&mut tree, "f", &["a"], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    assert!(changed);
    insta::assert_snapshot!(
        dump(&program),
        @"(script (function (name f) (params (name a) (name p0) (name p1)) (block (return (add (name a) (name p1))))))"
    );
}

// ── Validation aborts ────────────────────────────────────────────────────────

#[test]
fn test_dynamic_index_aborts_whole_function() {
    // function f(x) { return arguments[x] + arguments[0]; }
    // One unprovable access keeps even the provable one intact.
    let mut tree = Tree::new();
    let collection = tree.name("arguments");
    let x = tree.name("x");
    let dynamic = tree.get_elem(collection, x);
    let fixed = arguments_slot(&mut tree, 0.0);
    let sum = tree.binary(Token::Add, dynamic, fixed);
    let ret = tree.return_stmt(Some(sum));
    function_decl(&mut tree, "f", &["x"], vec![ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, changes) = materialize(&mut program);

    assert!(!changed);
    assert!(changes.is_empty());
    assert_eq!(dump(&program), before);
}

#[test]
fn test_negative_index_aborts() {
    // function f() { return arguments[-1]; }
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, -1.0);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, _) = materialize(&mut program);

    assert!(!changed);
    assert_eq!(dump(&program), before);
}

#[test]
fn test_fractional_index_aborts() {
    // function f() { return arguments[0.5]; }
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.5);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, _) = materialize(&mut program);

    assert!(!changed);
    assert_eq!(dump(&program), before);
}

#[test]
fn test_index_above_materialization_limit_aborts() {
    // function f() { return arguments[65536]; }
    // One past the largest index the pass will grow a formal for.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 65536.0);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, changes) = materialize(&mut program);

    assert!(!changed);
    assert!(changes.is_empty());
    assert_eq!(dump(&program), before);
}

#[test]
fn test_index_at_materialization_limit_is_rewritten() {
    // function f() { return arguments[65535]; }
    // The limit itself qualifies, padding formals for the whole range below.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 65535.0);
    let ret = tree.return_stmt(Some(access));
    let f = function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    assert!(changed);
    let params = program.tree.function_params(f).unwrap();
    assert_eq!(program.tree.child_count(params), 65536);
    let body = program.tree.function_body(f).unwrap();
    assert_eq!(program.tree.dump(body), "(block (return (name p65535)))");
}

#[test]
fn test_bare_alias_aborts() {
    // function f() { var a = arguments; return arguments[0]; }
    let mut tree = Tree::new();
    let alias_read = tree.name("arguments");
    let alias = tree.var_decl("a", Some(alias_read));
    let access = arguments_slot(&mut tree, 0.0);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![alias, ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, _) = materialize(&mut program);

    assert!(!changed);
    assert_eq!(dump(&program), before);
}

#[test]
fn test_length_read_aborts() {
    // function f() { return arguments.length; }
    let mut tree = Tree::new();
    let collection = tree.name("arguments");
    let length = tree.get_prop(collection, "length");
    let ret = tree.return_stmt(Some(length));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, _) = materialize(&mut program);

    assert!(!changed);
    assert_eq!(dump(&program), before);
}

#[test]
fn test_indexed_call_aborts() {
    // function f() { arguments[0](); }
    // The element read supplies the call receiver; a name read would not.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let call = tree.call(access, vec![]);
    let stmt = tree.expr_result(call);
    function_decl(&mut tree, "f", &[], vec![stmt]);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, _) = materialize(&mut program);

    assert!(!changed);
    assert_eq!(dump(&program), before);
}

#[test]
fn test_indexed_argument_of_call_is_rewritten() {
    // function f() { g(arguments[0]); }
    // Only the callee position is off-limits, not argument positions.
    let mut tree = Tree::new();
    let callee = tree.name("g");
    let access = arguments_slot(&mut tree, 0.0);
    let call = tree.call(callee, vec![access]);
    let stmt = tree.expr_result(call);
    function_decl(&mut tree, "f", &[], vec![stmt]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    assert!(changed);
    assert_eq!(
        dump(&program),
        "(script (function (name f) (params (name p0)) (block (expr (call (name g) (name p0))))))"
    );
}

// ── Scope handling ───────────────────────────────────────────────────────────

#[test]
fn test_arrow_access_is_charged_to_enclosing_function() {
    // function f() { return () => { return arguments[0]; }; }
    // Arrows do not rebind the collection: f grows the param.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let inner_ret = tree.return_stmt(Some(access));
    let arrow_params = tree.param_list(&[]);
    let arrow_body = tree.block(vec![inner_ret]);
    let arrow = tree.arrow_function(arrow_params, arrow_body);
    let ret = tree.return_stmt(Some(arrow));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    let mut expected = Tree::new();
    let access = expected.name("p0");
    let inner_ret = expected.return_stmt(Some(access));
    let arrow_params = expected.param_list(&[]);
    let arrow_body = expected.block(vec![inner_ret]);
    let arrow = expected.arrow_function(arrow_params, arrow_body);
    let ret = expected.return_stmt(Some(arrow));
    function_decl(&mut expected, "f", &["p0"], vec![ret]);

    assert!(changed);
    assert_eq!(dump(&program), expected.dump(expected.root()));
}

#[test]
fn test_nested_function_accesses_stay_separate() {
    // function outer() {
    //     function inner(x) { return arguments[x]; }
    //     return arguments[0];
    // }
    // inner aborts on its dynamic index; outer still materializes.
    let mut tree = Tree::new();
    let collection = tree.name("arguments");
    let x = tree.name("x");
    let dynamic = tree.get_elem(collection, x);
    let inner_ret = tree.return_stmt(Some(dynamic));
    let inner_params = tree.param_list(&["x"]);
    let inner_body = tree.block(vec![inner_ret]);
    let inner = tree.function("inner", inner_params, inner_body);
    let outer_access = arguments_slot(&mut tree, 0.0);
    let outer_ret = tree.return_stmt(Some(outer_access));
    function_decl(&mut tree, "outer", &[], vec![inner, outer_ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    let mut expected = Tree::new();
    let collection = expected.name("arguments");
    let x = expected.name("x");
    let dynamic = expected.get_elem(collection, x);
    let inner_ret = expected.return_stmt(Some(dynamic));
    let inner_params = expected.param_list(&["x"]);
    let inner_body = expected.block(vec![inner_ret]);
    let inner = expected.function("inner", inner_params, inner_body);
    let outer_access = expected.name("p0");
    let outer_ret = expected.return_stmt(Some(outer_access));
    function_decl(&mut expected, "outer", &["p0"], vec![inner, outer_ret]);

    assert!(changed);
    assert_eq!(dump(&program), expected.dump(expected.root()));
}

#[test]
fn test_top_level_access_is_ignored() {
    // arguments[0];
    // No enclosing function, nothing to materialize into.
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let stmt = tree.expr_result(access);
    let root = tree.root();
    tree.append_child(root, stmt);

    let mut program = normalized_program(tree);
    let before = dump(&program);
    let (changed, changes) = materialize(&mut program);

    assert!(!changed);
    assert!(changes.is_empty());
    assert_eq!(dump(&program), before);
}

#[test]
fn test_synthesized_names_are_unique_across_functions() {
    // function f() { return arguments[0]; }
    // function g() { return arguments[0]; }
    // The counter is shared, so g's new param cannot shadow f's.
    let mut tree = Tree::new();
    for name in ["f", "g"] {
        let access = arguments_slot(&mut tree, 0.0);
        let ret = tree.return_stmt(Some(access));
        function_decl(&mut tree, name, &[], vec![ret]);
    }

    let mut program = normalized_program(tree);
    let (changed, _) = materialize(&mut program);

    assert!(changed);
    assert_eq!(
        dump(&program),
        "(script \
         (function (name f) (params (name p0)) (block (return (name p0)))) \
         (function (name g) (params (name p1)) (block (return (name p1)))))"
    );
}

// ── Change accounting and idempotence ────────────────────────────────────────

#[test]
fn test_reports_signature_growth_and_each_replacement() {
    // function f() { return arguments[0] + arguments[1]; }
    // One report for the grown signature, one per rewritten access.
    let mut tree = Tree::new();
    let a0 = arguments_slot(&mut tree, 0.0);
    let a1 = arguments_slot(&mut tree, 1.0);
    let sum = tree.binary(Token::Add, a0, a1);
    let ret = tree.return_stmt(Some(sum));
    let f = function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let (_, changes) = materialize(&mut program);

    assert_eq!(changes.len(), 3);
    assert_eq!(changes.count_for(f), 3);
}

#[test]
fn test_idempotent_over_own_output() {
    // function f(a) { return arguments[0] + arguments[1]; }
    let mut tree = Tree::new();
    let a0 = arguments_slot(&mut tree, 0.0);
    let a1 = arguments_slot(&mut tree, 1.0);
    let sum = tree.binary(Token::Add, a0, a1);
    let ret = tree.return_stmt(Some(sum));
    function_decl(&mut tree, "f", &["a"], vec![ret]);

    let mut program = normalized_program(tree);
    let (first_changed, _) = materialize(&mut program);
    let after_first = dump(&program);
    let (second_changed, second_changes) = materialize(&mut program);

    assert!(first_changed);
    assert!(!second_changed);
    assert!(second_changes.is_empty());
    assert_eq!(dump(&program), after_first);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn test_default_prefix_is_collision_proof() {
    // function f() { return arguments[0]; }
    let mut tree = Tree::new();
    let access = arguments_slot(&mut tree, 0.0);
    let ret = tree.return_stmt(Some(access));
    function_decl(&mut tree, "f", &[], vec![ret]);

    let mut program = normalized_program(tree);
    let (changed, _) = materialize_arguments(&mut program);

    assert!(changed);
    assert!(dump(&program).contains("Callsign_ArgumentsToParams_p0"));
}

#[test]
fn test_requires_normalized_program() {
    let mut program = Program::new(Tree::new());
    let mut changes = ChangeLog::new();
    let mut pass = ArgumentsToParamsPass::new();

    let err = pass.run(&mut program, &mut changes).unwrap_err();
    assert_eq!(
        err,
        OptimizeError::NotNormalized {
            pass: "arguments-to-params"
        }
    );
}
