// Copyright (c) 2016-2021 Fabian Schuiki

//! Semantic binding for SystemVerilog expressions and statements.
//!
//! This crate converts parsed expression and statement syntax, together with
//! a lexical scope graph, into fully typed bound trees suitable for
//! elaboration and constant evaluation. The heart of the crate is the
//! [`Binder`], which resolves names, enforces which types each operator
//! admits, and computes result types in two passes: a bottom-up pass that
//! types every node from its subexpressions, and a top-down pass that widens
//! operands from the context they appear in.
//!
//! Failures never abort binding. Every entry point returns a well-typed
//! node; errors are reported as diagnostics and encoded as `Invalid` nodes
//! whose error type silences all further checks on enclosing expressions.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod ast;
pub mod binder;
pub mod bound;
pub mod context;
pub mod errors;
pub mod name;
pub mod source;
pub mod symbols;
pub mod ty;
pub mod value;

pub use crate::binder::Binder;
pub use crate::context::{Arenas, Compilation, Options, Verbosity};

/// The result of a fallible internal step. Errors that occur are reported
/// via diagnostics, which provide more information to the user; the `Err`
/// variant merely signals that something went wrong.
pub type Result<T> = std::result::Result<T, ()>;
