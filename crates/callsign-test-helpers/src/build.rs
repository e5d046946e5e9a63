//! Tree-building helpers for optimizer tests.
//!
//! Every helper appends finished statements to the script root so a test
//! reads top to bottom like the program it builds.

use callsign_ast::{NodeId, Tree};

/// Appends `function <name>(<params>) { ... }` to the script root.
///
/// # Arguments
/// * `body` - statement nodes, in order
///
/// # Returns
/// The function node.
pub fn function_decl(tree: &mut Tree, name: &str, params: &[&str], body: Vec<NodeId>) -> NodeId {
    let param_list = tree.param_list(params);
    let block = tree.block(body);
    let function = tree.function(name, param_list, block);
    let root = tree.root();
    tree.append_child(root, function);
    function
}

/// Appends `<name>(<args>);` to the script root.
///
/// # Returns
/// The call node (not the statement wrapper).
pub fn call_stmt(tree: &mut Tree, name: &str, args: Vec<NodeId>) -> NodeId {
    let callee = tree.name(name);
    let call = tree.call(callee, args);
    let stmt = tree.expr_result(call);
    let root = tree.root();
    tree.append_child(root, stmt);
    call
}

/// Appends `new <name>(<args>);` to the script root.
///
/// # Returns
/// The construct node (not the statement wrapper).
pub fn new_stmt(tree: &mut Tree, name: &str, args: Vec<NodeId>) -> NodeId {
    let callee = tree.name(name);
    let construct = tree.new_expr(callee, args);
    let stmt = tree.expr_result(construct);
    let root = tree.root();
    tree.append_child(root, stmt);
    construct
}

/// Builds the expression `arguments[<index>]`.
pub fn arguments_slot(tree: &mut Tree, index: f64) -> NodeId {
    let collection = tree.name("arguments");
    let slot = tree.number(index);
    tree.get_elem(collection, slot)
}
