//! Email primitives — attribute access, regex filtering, body extraction.

use std::sync::Arc;

use crate::action::ActionArgs;
use crate::error::{PrimitiveError, RegistryError};
use crate::primitives::{Primitive, compile_regex, invalid_args, require_str};
use crate::value::{EmailAttribute, Scalar, Value};

fn parse_attribute(action: &str, name: &str) -> Result<EmailAttribute, PrimitiveError> {
    EmailAttribute::parse(name)
        .ok_or_else(|| PrimitiveError::fatal(format!("{action}: unknown email attribute '{name}'")))
}

/// `EmailGetAttr <attribute>` — extract one header attribute as text.
pub struct EmailGetAttr;

impl Primitive for EmailGetAttr {
    fn name(&self) -> &'static str {
        "EmailGetAttr"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let attr = parse_attribute(self.name(), require_str(self.name(), args, 0)?)?;
        match input {
            Value::Scalar(Scalar::Email(email)) => Ok(Value::text(email.attribute(attr))),
            _ => Ok(Value::Absent),
        }
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        require_str(self.name(), args, 0)
            .and_then(|name| parse_attribute(self.name(), name))
            .map(|_| ())
            .map_err(|e| invalid_args(self.name(), e))
    }
}

/// `EmailFilterRegex <attribute> <regex>` — pass the email through when
/// the attribute matches, otherwise absent.
pub struct EmailFilterRegex;

impl Primitive for EmailFilterRegex {
    fn name(&self) -> &'static str {
        "EmailFilterRegex"
    }

    fn apply(&self, input: &Value, args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let attr = parse_attribute(self.name(), require_str(self.name(), args, 0)?)?;
        let regex = compile_regex(self.name(), require_str(self.name(), args, 1)?)?;
        match input {
            Value::Scalar(Scalar::Email(email)) if regex.is_match(email.attribute(attr)) => {
                Ok(Value::Scalar(Scalar::Email(Arc::clone(email))))
            }
            _ => Ok(Value::Absent),
        }
    }

    fn check_args(&self, args: Option<&ActionArgs>) -> Result<(), RegistryError> {
        let attr = require_str(self.name(), args, 0)
            .and_then(|name| parse_attribute(self.name(), name))
            .map(|_| ());
        let regex = require_str(self.name(), args, 1)
            .and_then(|p| compile_regex(self.name(), p))
            .map(|_| ());
        attr.and(regex).map_err(|e| invalid_args(self.name(), e))
    }
}

/// `EmailToHtml` — the decoded HTML body, absent for plain-text mail.
pub struct EmailToHtml;

impl Primitive for EmailToHtml {
    fn name(&self) -> &'static str {
        "EmailToHtml"
    }

    fn apply(&self, input: &Value, _args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        match input {
            Value::Scalar(Scalar::Email(email)) => Ok(email
                .html
                .as_deref()
                .map(Value::html)
                .unwrap_or(Value::Absent)),
            _ => Ok(Value::Absent),
        }
    }
}
