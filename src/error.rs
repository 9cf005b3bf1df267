//! Error types for mailsift.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Script compilation errors. Every variant carries the 1-based line
/// number of the offending script line so authors can find it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("Unmatched '}}' at line {line}")]
    UnmatchedClose { line: usize },

    #[error("Block opened at line {line} is never closed")]
    UnclosedBlock { line: usize },

    #[error("'{name}' at line {line} expects {expected} blocks, found {found}")]
    MissingBlock {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    #[error("Unexpected '{{' at line {line}: only combinators take blocks")]
    UnexpectedBlock { line: usize },

    #[error("'Additional' at line {line} has no preceding action to extend")]
    DanglingAdditional { line: usize },

    #[error("'Additional' at line {line} cannot extend combinator '{name}'")]
    AdditionalAfterCombinator { name: String, line: usize },

    #[error("'Additional' at line {line} carries no argument")]
    EmptyAdditional { line: usize },
}

/// Action/macro lookup and validation errors. Raised at macro-load time
/// wherever possible, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown action: {name}")]
    UnknownAction { name: String },

    #[error("'{name}' expects {expected} blocks, got {found}")]
    BlockArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid argument for '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Unknown macro: {name}")]
    UnknownMacro { name: String },

    #[error("Macro '{name}' references itself (directly or via another macro)")]
    RecursiveMacro { name: String },
}

/// Evaluation-time errors. Absence is *not* represented here — a missing
/// result is `Value::Absent`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Primitive '{action}' failed: {message}")]
    Primitive { action: String, message: String },
}

/// Macro-library configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse macro library: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to compile macro '{name}': {source}")]
    Script {
        name: String,
        #[source]
        source: CompileError,
    },
}

/// Failure inside an injected primitive.
///
/// Non-fatal by default: the evaluator logs the failure and substitutes
/// `Absent` for that element so the rest of the pipeline degrades
/// gracefully. A primitive that must abort the whole evaluation (rather
/// than lose one element) sets `fatal` and documents why.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PrimitiveError {
    pub message: String,
    pub fatal: bool,
}

impl PrimitiveError {
    /// A recoverable failure — this element becomes `Absent`.
    pub fn soft(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    /// A fatal failure — aborts the enclosing evaluation.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
