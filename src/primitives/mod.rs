//! Primitive actions — opaque one-in/one-out transforms.
//!
//! A [`Primitive`] is the injection seam for everything the engine does
//! not do itself: HTML selection, redirect following and any other
//! host-supplied step is registered here next to the standard pure set
//! (email attributes, regex text ops, URL access).
//!
//! Primitives participate in the evaluator's broadcast and absence
//! rules: they are applied element-wise over lists, and a wrong-domain
//! input yields `Absent` rather than an error.

mod email;
mod text;
mod url;

pub use email::{EmailFilterRegex, EmailGetAttr, EmailToHtml};
pub use text::{TextFilterRegex, TextMatchRegex, TextToHtml, TextToUrl};
pub use url::{UrlGetQuery, UrlGetSegment, UrlToText};

use crate::action::ActionArgs;
use crate::error::{PrimitiveError, RegistryError};
use crate::value::Value;

/// An externally supplied single-input/single-output transform.
///
/// `apply` receives the value *after* broadcast has unwrapped any list
/// structure, so implementations see scalars (or pairs), never the list
/// they were mapped over. Returning a `List` is allowed — a primitive
/// may fan one input out into many results (`TextMatchRegex` does).
///
/// Errors are non-fatal by default ([`PrimitiveError::soft`]): the
/// failing element becomes `Absent` and its siblings are unaffected.
/// Fatal conditions must be explicit ([`PrimitiveError::fatal`]) and
/// documented on the primitive.
pub trait Primitive: Send + Sync {
    /// Action name as written in scripts and wire trees.
    fn name(&self) -> &'static str;

    /// Transform one value.
    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError>;

    /// Validate static arguments at macro-load time. The default accepts
    /// anything; primitives with required or compiled arguments (regex
    /// patterns, indices) override this so authoring mistakes surface
    /// before evaluation.
    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        let _ = args;
        Ok(())
    }
}

// ── Argument helpers ────────────────────────────────────────────────

/// Fetch a required string argument. Missing or non-string arguments
/// are author mistakes, so the error is fatal.
pub(crate) fn require_str<'a>(
    action: &str,
    args: Option<&'a ActionArgs>,
    index: usize,
) -> Result<&'a str, PrimitiveError> {
    args.and_then(|a| a.scalar(index))
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            PrimitiveError::fatal(format!("{action}: missing string argument {index}"))
        })
}

/// Fetch a required integer argument. Fatal when missing or non-numeric.
pub(crate) fn require_int(
    action: &str,
    args: Option<&ActionArgs>,
    index: usize,
) -> Result<i64, PrimitiveError> {
    args.and_then(|a| a.scalar(index))
        .and_then(|v| v.as_i64())
        .ok_or_else(|| {
            PrimitiveError::fatal(format!("{action}: missing integer argument {index}"))
        })
}

/// Map a load-time argument check onto the registry's error type.
pub(crate) fn invalid_args(action: &str, err: PrimitiveError) -> RegistryError {
    RegistryError::InvalidArgument {
        name: action.to_string(),
        message: err.message,
    }
}

/// Compile a regex argument, fatal on a malformed pattern.
pub(crate) fn compile_regex(action: &str, pattern: &str) -> Result<regex::Regex, PrimitiveError> {
    regex::Regex::new(pattern)
        .map_err(|e| PrimitiveError::fatal(format!("{action}: invalid regex '{pattern}': {e}")))
}
