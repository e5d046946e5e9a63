//! Whole-program analyses shared by the optimization passes.
//!
//! The passes in this crate rewrite function signatures, so before touching
//! anything they need to know where a function is defined, where it is
//! referenced, and which names are visible at a given point. [`DefUseIndex`]
//! answers the first two questions, [`BindingScope`] the third.

pub mod bindings;
pub mod def_use;

pub use bindings::{BindingKind, BindingScope};
pub use def_use::{is_call_or_new_site, DefUseIndex, Definition, DefinitionId, DefinitionKind};
