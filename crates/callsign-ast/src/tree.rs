//! Arena-backed mutable program tree.
//!
//! The tree is the shared substrate of the optimizer: an untyped n-ary
//! tree of [`Token`]-tagged nodes with parent links, stored in an
//! [`id_arena::Arena`] so that `NodeId`s stay valid across mutation.
//! Detached subtrees remain alive in the arena and can be reattached
//! elsewhere, which is how argument expressions move from call sites into
//! callee bodies.
//!
//! # Usage
//!
//! ```
//! use callsign_ast::Tree;
//!
//! let mut tree = Tree::new();
//! let callee = tree.name("f");
//! let arg = tree.number(1.0);
//! let call = tree.call(callee, vec![arg]);
//! let stmt = tree.expr_result(call);
//! let root = tree.root();
//! tree.append_child(root, stmt);
//! assert_eq!(tree.dump(root), "(script (expr (call (name f) (number 1))))");
//! ```

use crate::effects::SideEffectFlags;
use crate::span::Span;
use crate::string_interner::{StringId, StringInterner};
use crate::token::Token;
use id_arena::{Arena, Id};
use std::sync::Arc;

pub type NodeId = Id<NodeData>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Payload {
    None,
    Name(StringId),
    Number(f64),
}

/// One node: kind tag, tree links, span, and an optional payload.
#[derive(Debug)]
pub struct NodeData {
    kind: Token,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    span: Span,
    payload: Payload,
    is_arrow: bool,
    side_effects: SideEffectFlags,
}

impl NodeData {
    fn new(kind: Token) -> Self {
        // Calls are assumed to do everything until an analysis proves less.
        let side_effects = if kind.is_call_or_new() {
            SideEffectFlags::all()
        } else {
            SideEffectFlags::empty()
        };
        NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            span: Span::dummy(),
            payload: Payload::None,
            is_arrow: false,
            side_effects,
        }
    }
}

/// A whole program tree rooted at a `Script` node.
pub struct Tree {
    nodes: Arena<NodeData>,
    root: NodeId,
    interner: Arc<StringInterner>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::with_interner(Arc::new(StringInterner::new()))
    }

    pub fn with_interner(interner: Arc<StringInterner>) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(NodeData::new(Token::Script));
        Tree {
            nodes,
            root,
            interner,
        }
    }

    pub fn interner(&self) -> &Arc<StringInterner> {
        &self.interner
    }

    pub fn intern(&self, text: &str) -> StringId {
        self.interner.get_or_intern(text)
    }

    // ---------------------------------------------------------------
    // Node factories. New nodes start detached with a dummy span.
    // ---------------------------------------------------------------

    /// Allocates a detached node of the given kind with no payload.
    pub fn new_node(&mut self, kind: Token) -> NodeId {
        self.nodes.alloc(NodeData::new(kind))
    }

    pub fn name(&mut self, text: &str) -> NodeId {
        let id = self.intern(text);
        self.name_from_id(id)
    }

    pub fn name_from_id(&mut self, name: StringId) -> NodeId {
        let node = self.new_node(Token::Name);
        self.nodes[node].payload = Payload::Name(name);
        node
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        let node = self.new_node(Token::Number);
        self.nodes[node].payload = Payload::Number(value);
        node
    }

    pub fn string(&mut self, text: &str) -> NodeId {
        let id = self.intern(text);
        let node = self.new_node(Token::Str);
        self.nodes[node].payload = Payload::Name(id);
        node
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.new_node(if value { Token::True } else { Token::False })
    }

    pub fn null(&mut self) -> NodeId {
        self.new_node(Token::Null)
    }

    pub fn this_expr(&mut self) -> NodeId {
        self.new_node(Token::This)
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let node = self.new_node(Token::Call);
        self.append_child(node, callee);
        for arg in args {
            self.append_child(node, arg);
        }
        node
    }

    pub fn new_expr(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let node = self.new_node(Token::New);
        self.append_child(node, callee);
        for arg in args {
            self.append_child(node, arg);
        }
        node
    }

    pub fn get_elem(&mut self, object: NodeId, index: NodeId) -> NodeId {
        let node = self.new_node(Token::GetElem);
        self.append_child(node, object);
        self.append_child(node, index);
        node
    }

    pub fn get_prop(&mut self, object: NodeId, prop: &str) -> NodeId {
        let id = self.intern(prop);
        let node = self.new_node(Token::GetProp);
        self.nodes[node].payload = Payload::Name(id);
        self.append_child(node, object);
        node
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let node = self.new_node(Token::Assign);
        self.append_child(node, target);
        self.append_child(node, value);
        node
    }

    pub fn var_decl(&mut self, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.intern(name);
        self.var_decl_from_id(id, init)
    }

    pub fn var_decl_from_id(&mut self, name: StringId, init: Option<NodeId>) -> NodeId {
        let node = self.new_node(Token::Var);
        let name_node = self.name_from_id(name);
        self.append_child(node, name_node);
        if let Some(init) = init {
            self.append_child(node, init);
        }
        node
    }

    pub fn expr_result(&mut self, expr: NodeId) -> NodeId {
        let node = self.new_node(Token::ExprResult);
        self.append_child(node, expr);
        node
    }

    pub fn return_stmt(&mut self, value: Option<NodeId>) -> NodeId {
        let node = self.new_node(Token::Return);
        if let Some(value) = value {
            self.append_child(node, value);
        }
        node
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let node = self.new_node(Token::Block);
        for stmt in stmts {
            self.append_child(node, stmt);
        }
        node
    }

    pub fn param_list(&mut self, names: &[&str]) -> NodeId {
        let node = self.new_node(Token::ParamList);
        for text in names {
            let param = self.name(text);
            self.append_child(node, param);
        }
        node
    }

    /// Builds `function name(params) body`. Pass an empty name for an
    /// anonymous function expression.
    pub fn function(&mut self, name: &str, params: NodeId, body: NodeId) -> NodeId {
        let node = self.new_node(Token::Function);
        let name_node = self.name(name);
        self.append_child(node, name_node);
        self.append_child(node, params);
        self.append_child(node, body);
        node
    }

    /// Builds an arrow function; same child shape as [`Tree::function`]
    /// with an empty name and the arrow flag set.
    pub fn arrow_function(&mut self, params: NodeId, body: NodeId) -> NodeId {
        let node = self.function("", params, body);
        self.nodes[node].is_arrow = true;
        node
    }

    pub fn binary(&mut self, op: Token, left: NodeId, right: NodeId) -> NodeId {
        debug_assert!(
            matches!(op, Token::Add | Token::Sub | Token::Mul | Token::Div),
            "binary: unexpected operator {op:?}"
        );
        let node = self.new_node(op);
        self.append_child(node, left);
        self.append_child(node, right);
        node
    }

    /// Prefix/postfix distinction does not matter to the optimizer; both
    /// read and write their operand.
    pub fn increment(&mut self, target: NodeId) -> NodeId {
        let node = self.new_node(Token::Inc);
        self.append_child(node, target);
        node
    }

    pub fn array_lit(&mut self, elements: Vec<NodeId>) -> NodeId {
        let node = self.new_node(Token::ArrayLit);
        for element in elements {
            self.append_child(node, element);
        }
        node
    }

    pub fn object_lit(&mut self, keys: Vec<NodeId>) -> NodeId {
        let node = self.new_node(Token::ObjectLit);
        for key in keys {
            self.append_child(node, key);
        }
        node
    }

    pub fn string_key(&mut self, key: &str, value: NodeId) -> NodeId {
        let id = self.intern(key);
        let node = self.new_node(Token::StringKey);
        self.nodes[node].payload = Payload::Name(id);
        self.append_child(node, value);
        node
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, node: NodeId) -> Token {
        self.nodes[node].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn grandparent(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).and_then(|p| self.parent(p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[node].children.get(index).copied()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node].children.len()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.child(node, 0)
    }

    pub fn second_child(&self, node: NodeId) -> Option<NodeId> {
        self.child(node, 1)
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].children.last().copied()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        self.child(parent, index + 1)
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.nodes[parent].children.iter().position(|&c| c == node)
    }

    /// Nearest `Function` at or above `node`.
    pub fn enclosing_function(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.kind(n) == Token::Function {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Nearest non-arrow `Function` at or above `node`. Arrow functions do
    /// not rebind the implicit arguments collection or `this`, so this is
    /// the scope those constructs resolve against.
    pub fn enclosing_non_arrow_function(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.kind(n) == Token::Function && !self.is_arrow_function(n) {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    pub fn function_name(&self, function: NodeId) -> Option<NodeId> {
        debug_assert_eq!(self.kind(function), Token::Function);
        self.child(function, 0)
    }

    pub fn function_params(&self, function: NodeId) -> Option<NodeId> {
        debug_assert_eq!(self.kind(function), Token::Function);
        self.child(function, 1)
    }

    pub fn function_body(&self, function: NodeId) -> Option<NodeId> {
        debug_assert_eq!(self.kind(function), Token::Function);
        self.child(function, 2)
    }

    // ---------------------------------------------------------------
    // Payload and attribute access
    // ---------------------------------------------------------------

    /// Interned name payload of `Name`, `Str`, `GetProp`, and `StringKey`
    /// nodes.
    pub fn name_of(&self, node: NodeId) -> Option<StringId> {
        match self.nodes[node].payload {
            Payload::Name(id) => Some(id),
            _ => None,
        }
    }

    pub fn number_of(&self, node: NodeId) -> Option<f64> {
        match self.nodes[node].payload {
            Payload::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_arrow_function(&self, node: NodeId) -> bool {
        self.nodes[node].is_arrow
    }

    pub fn span(&self, node: NodeId) -> Span {
        self.nodes[node].span
    }

    pub fn set_span(&mut self, node: NodeId, span: Span) {
        self.nodes[node].span = span;
    }

    pub fn side_effect_flags(&self, node: NodeId) -> SideEffectFlags {
        self.nodes[node].side_effects
    }

    pub fn set_side_effect_flags(&mut self, node: NodeId, flags: SideEffectFlags) {
        self.nodes[node].side_effects = flags;
    }

    /// Whether a call/construct may mutate objects reachable through its
    /// arguments.
    pub fn may_mutate_arguments(&self, call: NodeId) -> bool {
        debug_assert!(self.kind(call).is_call_or_new());
        self.side_effect_flags(call)
            .contains(SideEffectFlags::MUTATES_ARGUMENTS)
    }

    /// Whether a call/construct may mutate global state or throw.
    pub fn may_mutate_global_state_or_throw(&self, call: NodeId) -> bool {
        debug_assert!(self.kind(call).is_call_or_new());
        self.side_effect_flags(call)
            .intersects(SideEffectFlags::MUTATES_GLOBAL_STATE | SideEffectFlags::THROWS)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.nodes[child].parent.is_none(),
            "append_child: child is already attached"
        );
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.nodes[child].parent.is_none(),
            "prepend_child: child is already attached"
        );
        self.nodes[parent].children.insert(0, child);
        self.nodes[child].parent = Some(parent);
    }

    /// Detaches `child` from `parent`. The subtree stays alive and can be
    /// reattached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let Some(pos) = self.nodes[parent].children.iter().position(|&c| c == child) else {
            panic!("remove_child: node is not a child of the given parent");
        };
        self.nodes[parent].children.remove(pos);
        self.nodes[child].parent = None;
    }

    /// Swaps `old` for `new` in place, detaching `old`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        debug_assert!(
            self.nodes[new].parent.is_none(),
            "replace_child: replacement is already attached"
        );
        let Some(pos) = self.nodes[parent].children.iter().position(|&c| c == old) else {
            panic!("replace_child: node is not a child of the given parent");
        };
        self.nodes[parent].children[pos] = new;
        self.nodes[old].parent = None;
        self.nodes[new].parent = Some(parent);
    }

    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.remove_child(parent, node);
        }
    }

    // ---------------------------------------------------------------
    // Structural queries
    // ---------------------------------------------------------------

    /// Structural equality: kind, payload, arrow flag, and children,
    /// recursively. Spans and side-effect flags are ignored.
    pub fn equivalent(&self, a: NodeId, b: NodeId) -> bool {
        let na = &self.nodes[a];
        let nb = &self.nodes[b];
        if na.kind != nb.kind
            || na.payload != nb.payload
            || na.is_arrow != nb.is_arrow
            || na.children.len() != nb.children.len()
        {
            return false;
        }
        na.children
            .iter()
            .zip(nb.children.iter())
            .all(|(&ca, &cb)| self.equivalent(ca, cb))
    }

    /// Dotted qualified name of a `Name` / `GetProp` chain (or `this`).
    pub fn qualified_name(&self, node: NodeId) -> Option<String> {
        match self.kind(node) {
            Token::Name => {
                let id = self.name_of(node)?;
                let text = self.interner.resolve(id);
                if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Token::This => Some("this".to_string()),
            Token::GetProp => {
                let object = self.first_child(node)?;
                let base = self.qualified_name(object)?;
                let prop = self.name_of(node)?;
                Some(format!("{}.{}", base, self.interner.resolve(prop)))
            }
            _ => None,
        }
    }

    /// Deterministic S-expression rendering, used by tests and snapshots.
    pub fn dump(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(node, &mut out);
        out
    }

    fn dump_into(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node];
        out.push('(');
        out.push_str(self.dump_label(node));
        match data.payload {
            Payload::Name(id) => {
                let text = self.interner.resolve(id);
                if data.kind == Token::Str {
                    out.push_str(" \"");
                    out.push_str(&text);
                    out.push('"');
                } else if !text.is_empty() {
                    out.push(' ');
                    out.push_str(&text);
                }
            }
            Payload::Number(value) => {
                out.push(' ');
                out.push_str(&value.to_string());
            }
            Payload::None => {}
        }
        for &child in &data.children {
            out.push(' ');
            self.dump_into(child, out);
        }
        out.push(')');
    }

    fn dump_label(&self, node: NodeId) -> &'static str {
        let data = &self.nodes[node];
        match data.kind {
            Token::Script => "script",
            Token::Function => {
                if data.is_arrow {
                    "arrow"
                } else {
                    "function"
                }
            }
            Token::ParamList => "params",
            Token::Block => "block",
            Token::Name => "name",
            Token::Number => "number",
            Token::Str => "string",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::This => "this",
            Token::Call => "call",
            Token::New => "new",
            Token::GetElem => "getelem",
            Token::GetProp => "getprop",
            Token::Assign => "assign",
            Token::Var => "var",
            Token::Return => "return",
            Token::ExprResult => "expr",
            Token::Add => "add",
            Token::Sub => "sub",
            Token::Mul => "mul",
            Token::Div => "div",
            Token::Inc => "inc",
            Token::Dec => "dec",
            Token::ArrayLit => "array",
            Token::ObjectLit => "object",
            Token::StringKey => "key",
            Token::Try => "try",
            Token::Catch => "catch",
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}
