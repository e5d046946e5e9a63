//! Lexical binding lookup.
//!
//! Answers one question for the movability test: at a given tree
//! position, is this name bound by an enclosing function (parameter,
//! hoisted `var`, function declaration, function-expression self-name) or
//! by an enclosing catch clause? Top-level `var`s are deliberately not
//! collected; a global name resolves the same from anywhere, which is
//! exactly what makes an expression over globals safe to relocate.

use callsign_ast::{NodeId, StringId, Token, Tree};
use rustc_hash::FxHashMap;

/// How a name is bound at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Param,
    Var,
    Function,
    CatchParam,
}

/// Bindings visible at one tree position, nearest declaration first.
pub struct BindingScope {
    bindings: FxHashMap<StringId, BindingKind>,
}

impl BindingScope {
    /// Collects every function-scoped and catch-scoped binding visible at
    /// `site` by walking outward to the top level.
    pub fn at(tree: &Tree, site: NodeId) -> Self {
        let mut bindings = FxHashMap::default();
        let mut cur = site;
        while let Some(parent) = tree.parent(cur) {
            match tree.kind(parent) {
                // The caught name is in scope only inside the catch block.
                Token::Catch if tree.index_in_parent(cur) == Some(1) => {
                    if let Some(name) = tree.first_child(parent).and_then(|n| tree.name_of(n)) {
                        add(&mut bindings, name, BindingKind::CatchParam);
                    }
                }
                Token::Function => collect_function_bindings(tree, parent, &mut bindings),
                _ => {}
            }
            cur = parent;
        }
        BindingScope { bindings }
    }

    pub fn lookup(&self, name: StringId) -> Option<BindingKind> {
        self.bindings.get(&name).copied()
    }

    pub fn is_local(&self, name: StringId) -> bool {
        self.bindings.contains_key(&name)
    }
}

fn add(bindings: &mut FxHashMap<StringId, BindingKind>, name: StringId, kind: BindingKind) {
    // Walk order is inner to outer, so the nearest binding wins.
    bindings.entry(name).or_insert(kind);
}

fn collect_function_bindings(
    tree: &Tree,
    function: NodeId,
    bindings: &mut FxHashMap<StringId, BindingKind>,
) {
    // A function expression's name is visible inside its own body.
    if let Some(name) = tree.function_name(function).and_then(|n| tree.name_of(n)) {
        if !tree.interner().resolve(name).is_empty() {
            add(bindings, name, BindingKind::Function);
        }
    }
    if let Some(params) = tree.function_params(function) {
        for &param in tree.children(params) {
            if let Some(name) = tree.name_of(param) {
                add(bindings, name, BindingKind::Param);
            }
        }
    }
    if let Some(body) = tree.function_body(function) {
        collect_hoisted(tree, body, bindings);
    }
}

/// Collects `var` and function-declaration names hoisted to function
/// scope. Statement-only walk: expressions cannot declare hoisted names,
/// and nested function bodies keep their bindings to themselves.
fn collect_hoisted(tree: &Tree, stmt: NodeId, bindings: &mut FxHashMap<StringId, BindingKind>) {
    match tree.kind(stmt) {
        Token::Function => {
            if let Some(name) = tree.function_name(stmt).and_then(|n| tree.name_of(n)) {
                if !tree.interner().resolve(name).is_empty() {
                    add(bindings, name, BindingKind::Function);
                }
            }
        }
        Token::Var => {
            if let Some(name) = tree.first_child(stmt).and_then(|n| tree.name_of(n)) {
                add(bindings, name, BindingKind::Var);
            }
        }
        Token::Block => {
            for &child in tree.children(stmt) {
                collect_hoisted(tree, child, bindings);
            }
        }
        Token::Try => {
            for &child in tree.children(stmt) {
                collect_hoisted(tree, child, bindings);
            }
        }
        // The catch param is catch-scoped, not hoisted; only the blocks
        // under the clause contribute.
        Token::Catch => {
            if let Some(block) = tree.second_child(stmt) {
                collect_hoisted(tree, block, bindings);
            }
        }
        _ => {}
    }
}
