//! URL primitives — text conversion, query and path-segment access.

use crate::action::ActionArgs;
use crate::error::{PrimitiveError, RegistryError};
use crate::primitives::{Primitive, invalid_args, require_int, require_str};
use crate::value::{Scalar, Value};

/// `UrlToText` — the URL serialized back to text.
pub struct UrlToText;

impl Primitive for UrlToText {
    fn name(&self) -> &'static str {
        "UrlToText"
    }

    fn apply(&self, input: &Value, _args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        match input {
            Value::Scalar(Scalar::Url(url)) => Ok(Value::text(url.to_string())),
            _ => Ok(Value::Absent),
        }
    }
}

/// `UrlGetQuery <name>` — the value of the first query parameter with
/// that name, absent when missing.
pub struct UrlGetQuery;

impl Primitive for UrlGetQuery {
    fn name(&self) -> &'static str {
        "UrlGetQuery"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let wanted = require_str(self.name(), args, 0)?;
        match input {
            Value::Scalar(Scalar::Url(url)) => Ok(url
                .query_pairs()
                .find(|(key, _)| key == wanted)
                .map(|(_, value)| Value::text(value.into_owned()))
                .unwrap_or(Value::Absent)),
            _ => Ok(Value::Absent),
        }
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        require_str(self.name(), args, 0)
            .map(|_| ())
            .map_err(|e| invalid_args(self.name(), e))
    }
}

/// `UrlGetSegment <n>` — the n-th path segment; negative `n` counts from
/// the end (`-1` is the last segment). Out of range is absent.
pub struct UrlGetSegment;

impl Primitive for UrlGetSegment {
    fn name(&self) -> &'static str {
        "UrlGetSegment"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let index = require_int(self.name(), args, 0)?;
        let Value::Scalar(Scalar::Url(url)) = input else {
            return Ok(Value::Absent);
        };
        let Some(mut segments) = url.path_segments() else {
            // cannot-be-a-base URLs (mailto:, data:) have no segments
            return Ok(Value::Absent);
        };

        let segment = if index < 0 {
            // unsigned_abs keeps i64::MIN from overflowing on negation
            segments.rev().nth(index.unsigned_abs() as usize - 1)
        } else {
            segments.nth(index as usize)
        };
        Ok(segment.map(Value::text).unwrap_or(Value::Absent))
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        require_int(self.name(), args, 0)
            .map(|_| ())
            .map_err(|e| invalid_args(self.name(), e))
    }
}
