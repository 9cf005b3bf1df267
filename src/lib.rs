//! mailsift — declarative action-pipeline engine for extracting
//! structured facts (tracking numbers, SKUs, sender addresses) from
//! email-derived values.

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod primitives;
pub mod render;
pub mod script;
pub mod value;
