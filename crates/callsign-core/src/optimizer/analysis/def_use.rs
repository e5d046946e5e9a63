//! Whole-program definition/use-site index.
//!
//! Maps every named function definition to the places that reference it,
//! so the signature pass can prove it sees *all* callers before touching
//! a signature. Matching is by simplified name: a plain name keys as
//! itself, a property or object-literal key as `*.<prop>`. The property
//! form is deliberately coarse: without type information, a call through
//! any same-named property may reach any such definition, and the
//! resulting multi-definition answer is what keeps the pass conservative.
//!
//! The index is built once per pass run and maintained incrementally
//! while the pass rewrites: before a subtree holding references is
//! deleted, [`DefUseIndex::remove_references`] drops its entries so later
//! queries stay honest.

use crate::program::Program;
use callsign_ast::{NodeId, Token, Tree};
use rustc_hash::{FxHashMap, FxHashSet};

pub type DefinitionId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// `function f() {}` at statement level.
    Declaration,
    /// `var f = function() {}`.
    VarInitializer,
    /// `f = function() {}` or `a.b = function() {}`.
    Assignment,
    /// `{ key: function() {} }`.
    ObjectLiteralKey,
}

/// One named function definition.
#[derive(Debug)]
pub struct Definition {
    /// The function node itself.
    pub function: NodeId,
    /// The node naming the definition: a `Name`, `GetProp`, or
    /// `StringKey`.
    pub lvalue: NodeId,
    pub kind: DefinitionKind,
    /// Whether the defined name is visible to the host environment.
    pub in_externs: bool,
    simplified_name: String,
}

impl Definition {
    pub fn simplified_name(&self) -> &str {
        &self.simplified_name
    }
}

pub struct DefUseIndex {
    definitions: Vec<Definition>,
    by_simple_name: FxHashMap<String, Vec<DefinitionId>>,
    use_sites: Vec<Vec<NodeId>>,
    def_lvalues: FxHashSet<NodeId>,
}

impl DefUseIndex {
    /// Builds the index over the whole program: definitions first, then
    /// every reference to a known simplified name, in source order.
    pub fn build(program: &Program) -> Self {
        let tree = &program.tree;
        let mut index = DefUseIndex {
            definitions: Vec::new(),
            by_simple_name: FxHashMap::default(),
            use_sites: Vec::new(),
            def_lvalues: FxHashSet::default(),
        };
        index.collect_definitions(tree, program, tree.root());
        index.collect_uses(tree, tree.root());
        index
    }

    /// Definition ids in discovery (source) order. Callers that rewrite
    /// while iterating should collect this snapshot first.
    pub fn definition_ids(&self) -> std::ops::Range<DefinitionId> {
        0..self.definitions.len()
    }

    pub fn definition(&self, id: DefinitionId) -> &Definition {
        &self.definitions[id]
    }

    pub fn use_sites(&self, id: DefinitionId) -> &[NodeId] {
        &self.use_sites[id]
    }

    /// Whether the index can promise that rewriting this definition is
    /// sound from its side: the name is not extern-visible and the
    /// definition has a form whose aliases the index tracks. Property
    /// slots in object literals fail the latter.
    pub fn can_modify(&self, id: DefinitionId) -> bool {
        let definition = &self.definitions[id];
        !definition.in_externs && definition.kind != DefinitionKind::ObjectLiteralKey
    }

    /// Definitions a reference node may resolve to. More than one answer
    /// means the call target is ambiguous.
    pub fn definitions_referenced_at(&self, tree: &Tree, node: NodeId) -> &[DefinitionId] {
        let Some(key) = simplified_name_at(tree, node) else {
            return &[];
        };
        self.by_simple_name
            .get(key.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops every use-site entry inside `root`'s subtree. Call this
    /// before detaching a subtree that is going away for good; skip it
    /// for subtrees that are merely moved.
    pub fn remove_references(&mut self, tree: &Tree, root: NodeId) {
        let mut doomed = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            doomed.insert(node);
            stack.extend_from_slice(tree.children(node));
        }
        for sites in &mut self.use_sites {
            sites.retain(|site| !doomed.contains(site));
        }
    }

    fn collect_definitions(&mut self, tree: &Tree, program: &Program, node: NodeId) {
        if tree.kind(node) == Token::Function {
            if let Some((lvalue, kind)) = classify_definition(tree, node) {
                if let Some(simplified_name) = simplified_lvalue_name(tree, lvalue) {
                    let in_externs = tree
                        .qualified_name(lvalue)
                        .map_or(false, |qname| program.is_extern(&qname));
                    let id = self.definitions.len();
                    self.definitions.push(Definition {
                        function: node,
                        lvalue,
                        kind,
                        in_externs,
                        simplified_name: simplified_name.clone(),
                    });
                    self.by_simple_name
                        .entry(simplified_name)
                        .or_default()
                        .push(id);
                    self.use_sites.push(Vec::new());
                    self.def_lvalues.insert(lvalue);
                }
            }
        }
        for &child in tree.children(node) {
            self.collect_definitions(tree, program, child);
        }
    }

    fn collect_uses(&mut self, tree: &Tree, node: NodeId) {
        if is_reference_position(tree, node) && !self.def_lvalues.contains(&node) {
            if let Some(key) = simplified_name_at(tree, node) {
                if let Some(ids) = self.by_simple_name.get(key.as_str()) {
                    for &id in ids {
                        self.use_sites[id].push(node);
                    }
                }
            }
        }
        for &child in tree.children(node) {
            self.collect_uses(tree, child);
        }
    }
}

/// Whether `site` is the callee of a call or construct expression.
pub fn is_call_or_new_site(tree: &Tree, site: NodeId) -> bool {
    match tree.parent(site) {
        Some(parent) => {
            tree.kind(parent).is_call_or_new() && tree.first_child(parent) == Some(site)
        }
        None => false,
    }
}

fn classify_definition(tree: &Tree, function: NodeId) -> Option<(NodeId, DefinitionKind)> {
    let parent = tree.parent(function)?;
    match tree.kind(parent) {
        Token::Script | Token::Block => {
            let name = tree.function_name(function)?;
            Some((name, DefinitionKind::Declaration))
        }
        Token::Var if tree.index_in_parent(function) == Some(1) => {
            let name = tree.first_child(parent)?;
            Some((name, DefinitionKind::VarInitializer))
        }
        Token::Assign if tree.index_in_parent(function) == Some(1) => {
            let lvalue = tree.first_child(parent)?;
            Some((lvalue, DefinitionKind::Assignment))
        }
        Token::StringKey => Some((parent, DefinitionKind::ObjectLiteralKey)),
        _ => None,
    }
}

/// Simplified-name key for a definition lvalue, `None` when the form has
/// no usable name (anonymous declaration, computed target).
fn simplified_lvalue_name(tree: &Tree, lvalue: NodeId) -> Option<String> {
    match tree.kind(lvalue) {
        Token::Name => {
            let text = tree.interner().resolve(tree.name_of(lvalue)?);
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Token::GetProp | Token::StringKey => {
            let prop = tree.interner().resolve(tree.name_of(lvalue)?);
            Some(format!("*.{prop}"))
        }
        _ => None,
    }
}

/// Simplified-name key for a reference node.
fn simplified_name_at(tree: &Tree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        Token::Name => {
            let text = tree.interner().resolve(tree.name_of(node)?);
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Token::GetProp => {
            let prop = tree.interner().resolve(tree.name_of(node)?);
            Some(format!("*.{prop}"))
        }
        _ => None,
    }
}

/// Whether a `Name`/`GetProp` node is a value reference rather than a
/// declaring occurrence.
fn is_reference_position(tree: &Tree, node: NodeId) -> bool {
    match tree.kind(node) {
        Token::Name => match tree.parent(node) {
            Some(parent) => match tree.kind(parent) {
                // Parameter names, declared names, and the name slot of a
                // function or catch clause declare, they do not reference.
                Token::ParamList => false,
                Token::Function | Token::Var | Token::Catch => {
                    tree.index_in_parent(node) != Some(0)
                }
                _ => true,
            },
            None => false,
        },
        Token::GetProp => true,
        _ => false,
    }
}
