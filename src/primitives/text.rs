//! Text primitives — regex matching and filtering, domain conversions.

use std::sync::Arc;

use url::Url;

use crate::action::ActionArgs;
use crate::error::{PrimitiveError, RegistryError};
use crate::primitives::{Primitive, compile_regex, invalid_args, require_str};
use crate::value::{Scalar, Value};

/// Text-ish scalars: `Text` and argument-derived `Str` are treated the
/// same by text primitives.
fn as_text(input: &Value) -> Option<&Arc<str>> {
    match input {
        Value::Scalar(Scalar::Text(s)) | Value::Scalar(Scalar::Str(s)) => Some(s),
        _ => None,
    }
}

/// `TextMatchRegex <regex> <template>` — one output per match, with
/// `$n` / `$name` capture expansion in the template. No matches yields
/// absent so broadcast drops the element.
pub struct TextMatchRegex;

impl Primitive for TextMatchRegex {
    fn name(&self) -> &'static str {
        "TextMatchRegex"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let regex = compile_regex(self.name(), require_str(self.name(), args, 0)?)?;
        let template = require_str(self.name(), args, 1)?;
        let Some(text) = as_text(input) else {
            return Ok(Value::Absent);
        };

        let mut matches = Vec::new();
        for captures in regex.captures_iter(text) {
            let mut expanded = String::new();
            captures.expand(template, &mut expanded);
            matches.push(Value::text(expanded));
        }
        if matches.is_empty() {
            Ok(Value::Absent)
        } else {
            Ok(Value::List(matches))
        }
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        require_str(self.name(), args, 0)
            .and_then(|p| compile_regex(self.name(), p))
            .and_then(|_| require_str(self.name(), args, 1))
            .map(|_| ())
            .map_err(|e| invalid_args(self.name(), e))
    }
}

/// `TextFilterRegex <regex>` — pass the text through on match.
pub struct TextFilterRegex;

impl Primitive for TextFilterRegex {
    fn name(&self) -> &'static str {
        "TextFilterRegex"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let regex = compile_regex(self.name(), require_str(self.name(), args, 0)?)?;
        match as_text(input) {
            Some(text) if regex.is_match(text) => Ok(Value::Scalar(Scalar::Text(Arc::clone(text)))),
            _ => Ok(Value::Absent),
        }
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        require_str(self.name(), args, 0)
            .and_then(|p| compile_regex(self.name(), p))
            .map(|_| ())
            .map_err(|e| invalid_args(self.name(), e))
    }
}

/// `TextToHtml` — retag text as an HTML fragment (no parsing happens
/// here; the HTML collaborator consumes the fragment downstream).
pub struct TextToHtml;

impl Primitive for TextToHtml {
    fn name(&self) -> &'static str {
        "TextToHtml"
    }

    fn apply(&self, input: &Value, _args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        match as_text(input) {
            Some(text) => Ok(Value::Scalar(Scalar::Html(Arc::clone(text)))),
            None => Ok(Value::Absent),
        }
    }
}

/// `TextToUrl` — parse text as a URL. Unparseable text is data, not an
/// authoring mistake, so it degrades to absent.
pub struct TextToUrl;

impl Primitive for TextToUrl {
    fn name(&self) -> &'static str {
        "TextToUrl"
    }

    fn apply(&self, input: &Value, _args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        match as_text(input) {
            Some(text) => Ok(Url::parse(text)
                .map(Value::url)
                .unwrap_or(Value::Absent)),
            None => Ok(Value::Absent),
        }
    }
}
