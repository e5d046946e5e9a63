//! Side-effect model for expression subtrees.
//!
//! Two complementary questions drive the signature rewrites:
//!
//! - can evaluating this expression *change* anything observable
//!   ([`may_have_side_effects`]), and
//! - can something else changing state *alter what this expression
//!   evaluates to* ([`can_be_side_effected`]).
//!
//! Calls are the imprecise case. Every call/construct node carries a
//! [`SideEffectFlags`] set that starts at worst-case; a purity analysis
//! upstream may narrow it, and the optimizer widens it back when a rewrite
//! exposes new behavior. Everything here is conservative: when a node kind
//! is not an expression the answer is "yes, effects are possible".

use crate::token::Token;
use crate::tree::{NodeId, Tree};
use bitflags::bitflags;

bitflags! {
    /// What a call or construct site may do, beyond returning a value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SideEffectFlags: u8 {
        /// May write state visible outside the call (globals, heap).
        const MUTATES_GLOBAL_STATE = 1 << 0;
        /// May mutate the receiver.
        const MUTATES_THIS = 1 << 1;
        /// May mutate objects reachable through its arguments.
        const MUTATES_ARGUMENTS = 1 << 2;
        /// May throw.
        const THROWS = 1 << 3;
    }
}

/// Whether evaluating `node` can change observable state or throw.
pub fn may_have_side_effects(tree: &Tree, node: NodeId) -> bool {
    match tree.kind(node) {
        Token::Call | Token::New => {
            !tree.side_effect_flags(node).is_empty()
                || tree
                    .children(node)
                    .iter()
                    .any(|&c| may_have_side_effects(tree, c))
        }
        Token::Assign | Token::Inc | Token::Dec => true,
        // Creating a closure evaluates nothing inside it.
        Token::Function => false,
        Token::Name
        | Token::Number
        | Token::Str
        | Token::True
        | Token::False
        | Token::Null
        | Token::This
        | Token::GetElem
        | Token::GetProp
        | Token::Add
        | Token::Sub
        | Token::Mul
        | Token::Div
        | Token::ArrayLit
        | Token::ObjectLit
        | Token::StringKey => tree
            .children(node)
            .iter()
            .any(|&c| may_have_side_effects(tree, c)),
        // Statement-level kinds are not expressions; answer conservatively.
        Token::Script
        | Token::ParamList
        | Token::Block
        | Token::Var
        | Token::Return
        | Token::ExprResult
        | Token::Try
        | Token::Catch => true,
    }
}

/// Whether some other code running first could change what `node`
/// evaluates to.
pub fn can_be_side_effected(tree: &Tree, node: NodeId) -> bool {
    match tree.kind(node) {
        // A variable can be reassigned, a property or element re-pointed,
        // and a call's result depends on arbitrary state.
        Token::Call | Token::New | Token::Name | Token::GetElem | Token::GetProp => true,
        // A function literal always evaluates to the same closure shape.
        Token::Function => false,
        Token::Number | Token::Str | Token::True | Token::False | Token::Null | Token::This => {
            false
        }
        Token::Assign
        | Token::Inc
        | Token::Dec
        | Token::Add
        | Token::Sub
        | Token::Mul
        | Token::Div
        | Token::ArrayLit
        | Token::ObjectLit
        | Token::StringKey => tree
            .children(node)
            .iter()
            .any(|&c| can_be_side_effected(tree, c)),
        Token::Script
        | Token::ParamList
        | Token::Block
        | Token::Var
        | Token::Return
        | Token::ExprResult
        | Token::Try
        | Token::Catch => true,
    }
}

/// Whether `node` is a literal whose value no code can change.
pub fn is_immutable_value(tree: &Tree, node: NodeId) -> bool {
    tree.kind(node).is_literal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_inert() {
        let mut tree = Tree::new();
        let n = tree.number(4.0);
        let s = tree.string("x");
        for node in [n, s] {
            assert!(!may_have_side_effects(&tree, node));
            assert!(!can_be_side_effected(&tree, node));
            assert!(is_immutable_value(&tree, node));
        }
    }

    #[test]
    fn names_are_readable_but_not_effectful() {
        let mut tree = Tree::new();
        let g = tree.name("g");
        assert!(!may_have_side_effects(&tree, g));
        assert!(can_be_side_effected(&tree, g));
        assert!(!is_immutable_value(&tree, g));
    }

    #[test]
    fn writes_are_effectful() {
        let mut tree = Tree::new();
        let target = tree.name("g");
        let value = tree.number(1.0);
        let assign = tree.assign(target, value);
        assert!(may_have_side_effects(&tree, assign));

        let target2 = tree.name("counter");
        let inc = tree.increment(target2);
        assert!(may_have_side_effects(&tree, inc));
    }

    #[test]
    fn call_flags_drive_the_effect_answer() {
        let mut tree = Tree::new();
        let callee = tree.name("f");
        let arg = tree.number(1.0);
        let call = tree.call(callee, vec![arg]);
        assert!(may_have_side_effects(&tree, call));

        tree.set_side_effect_flags(call, SideEffectFlags::empty());
        assert!(!may_have_side_effects(&tree, call));
        // Even a pure call still reads state.
        assert!(can_be_side_effected(&tree, call));
    }

    #[test]
    fn effectful_argument_survives_pure_call_flags() {
        let mut tree = Tree::new();
        let callee = tree.name("f");
        let target = tree.name("g");
        let arg = tree.increment(target);
        let call = tree.call(callee, vec![arg]);
        tree.set_side_effect_flags(call, SideEffectFlags::empty());
        assert!(may_have_side_effects(&tree, call));
    }

    #[test]
    fn function_literals_are_insulated() {
        let mut tree = Tree::new();
        let params = tree.param_list(&[]);
        let target = tree.name("g");
        let value = tree.number(1.0);
        let assign = tree.assign(target, value);
        let stmt = tree.expr_result(assign);
        let body = tree.block(vec![stmt]);
        let f = tree.function("", params, body);
        assert!(!may_have_side_effects(&tree, f));
        assert!(!can_be_side_effected(&tree, f));
    }

    #[test]
    fn property_reads_can_be_side_effected() {
        let mut tree = Tree::new();
        let base = tree.name("o");
        let prop = tree.get_prop(base, "p");
        assert!(!may_have_side_effects(&tree, prop));
        assert!(can_be_side_effected(&tree, prop));
    }
}
