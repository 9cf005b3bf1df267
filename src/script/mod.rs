//! Textual macro scripts and their compiler.

mod compiler;

pub use compiler::compile;
