//! Tree substrate for the Callsign optimizer.
//!
//! This crate defines the mutable, arena-backed program tree the
//! signature-optimization passes in `callsign-core` operate on, together
//! with the string interner, source spans, and the side-effect model
//! attached to call sites. It contains no optimizer logic; producing a
//! tree from source text (parsing, normalization) happens upstream.

pub mod effects;
pub mod span;
pub mod string_interner;
pub mod token;
pub mod tree;

pub use effects::{can_be_side_effected, is_immutable_value, may_have_side_effects, SideEffectFlags};
pub use span::Span;
pub use string_interner::{StringId, StringInterner};
pub use token::Token;
pub use tree::{NodeData, NodeId, Tree};
