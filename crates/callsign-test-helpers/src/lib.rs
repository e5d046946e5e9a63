//! Test utilities and fixtures for Callsign
//!
//! Provides tree builders and pipeline runners so optimizer tests can state
//! a program, run the passes, and compare dumps without boilerplate.

pub mod build;
pub mod run;

pub use build::{arguments_slot, call_stmt, function_decl, new_stmt};
pub use run::{
    dump, materialize_arguments, normalized_program, optimize, optimize_at, optimize_signatures,
    run_pass,
};
