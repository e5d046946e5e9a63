//! Node kinds for the post-normalization tree.

/// Kind tag of a tree node.
///
/// The tree is untyped and n-ary; each kind documents its expected child
/// shape where the optimizer relies on it:
///
/// - `Function`: `[Name, ParamList, Block]`. Anonymous functions carry an
///   empty-string name. Arrow functions use the same shape plus the
///   per-node arrow flag.
/// - `Var`: `[Name]` or `[Name, init]`. Normalization splits multi-name
///   declarations, so one name per statement.
/// - `GetProp`: `[object]`, the property name is node payload.
/// - `StringKey`: `[value]`, the key name is node payload.
/// - `Catch`: `[Name, Block]`.
/// - `Call` / `New`: `[callee, arg0, arg1, ...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Script,
    Function,
    ParamList,
    Block,

    Name,
    Number,
    Str,
    True,
    False,
    Null,
    This,

    Call,
    New,
    GetElem,
    GetProp,

    Assign,
    Var,
    Return,
    ExprResult,

    Add,
    Sub,
    Mul,
    Div,
    Inc,
    Dec,

    ArrayLit,
    ObjectLit,
    StringKey,

    Try,
    Catch,
}

impl Token {
    /// Literal value kinds: immutable, effect-free leaves.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Token::Number | Token::Str | Token::True | Token::False | Token::Null
        )
    }

    /// Kinds that invoke a function: `Call` and `New`.
    pub fn is_call_or_new(self) -> bool {
        matches!(self, Token::Call | Token::New)
    }
}
