//! The runtime value algebra — domain-tagged scalars, lists, pairs, absence.
//!
//! Every datum flowing through a pipeline is a [`Value`]. The union is
//! deliberately exhaustive: adding a shape forces every combinator site
//! in the evaluator to be revisited.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ── Email datum ─────────────────────────────────────────────────────

/// Email attributes addressable by primitives (`EmailGetAttr`,
/// `EmailFilterRegex`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailAttribute {
    Id,
    FromAddress,
    ToAddress,
    Subject,
}

impl EmailAttribute {
    /// Parse an attribute name as written in a script argument.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Id" => Some(Self::Id),
            "FromAddress" => Some(Self::FromAddress),
            "ToAddress" => Some(Self::ToAddress),
            "Subject" => Some(Self::Subject),
            _ => None,
        }
    }
}

/// An already-decoded email.
///
/// The IMAP/MIME collaborator fills this in before evaluation begins —
/// the engine never touches the network or a mailbox itself. `html` is
/// the decoded HTML body, if the message had one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Email {
    /// Look up an attribute by tag.
    pub fn attribute(&self, attr: EmailAttribute) -> &str {
        match attr {
            EmailAttribute::Id => &self.id,
            EmailAttribute::FromAddress => &self.from_address,
            EmailAttribute::ToAddress => &self.to_address,
            EmailAttribute::Subject => &self.subject,
        }
    }
}

// ── Scalar ──────────────────────────────────────────────────────────

/// A leaf datum tagged with its semantic domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Email(Arc<Email>),
    Html(Arc<str>),
    Text(Arc<str>),
    Url(Url),
    Number(f64),
    Str(Arc<str>),
}

// ── Value ───────────────────────────────────────────────────────────

/// The universal runtime datum.
///
/// `Absent` is the engine's first-class "no result here" — it is not an
/// error, propagates silently, and is filtered out of lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
    Pair(Box<Value>, Box<Value>),
    Absent,
}

impl Value {
    /// Construct a `Text` scalar.
    pub fn text(content: impl Into<Arc<str>>) -> Self {
        Value::Scalar(Scalar::Text(content.into()))
    }

    /// Construct an `Html` scalar.
    pub fn html(content: impl Into<Arc<str>>) -> Self {
        Value::Scalar(Scalar::Html(content.into()))
    }

    /// Construct an `Email` scalar.
    pub fn email(email: Email) -> Self {
        Value::Scalar(Scalar::Email(Arc::new(email)))
    }

    /// Construct a `Url` scalar.
    pub fn url(url: Url) -> Self {
        Value::Scalar(Scalar::Url(url))
    }

    /// Construct a `Number` scalar.
    pub fn number(n: f64) -> Self {
        Value::Scalar(Scalar::Number(n))
    }

    /// Construct a `Pair`.
    pub fn pair(left: Value, right: Value) -> Self {
        Value::Pair(Box::new(left), Box::new(right))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// `Absent` or an empty `List` — the shapes `Or` falls through on.
    pub fn is_vacant(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Truthiness as seen by `Filter` predicates: everything except
    /// `Absent`, the empty string, numeric zero, and the empty list.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::List(items) => !items.is_empty(),
            Value::Pair(_, _) => true,
            Value::Scalar(scalar) => match scalar {
                Scalar::Number(n) => *n != 0.0,
                Scalar::Html(s) | Scalar::Text(s) | Scalar::Str(s) => !s.is_empty(),
                Scalar::Email(_) | Scalar::Url(_) => true,
            },
        }
    }

    /// Short domain label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::Email(_)) => "email",
            Value::Scalar(Scalar::Html(_)) => "html",
            Value::Scalar(Scalar::Text(_)) => "text",
            Value::Scalar(Scalar::Url(_)) => "url",
            Value::Scalar(Scalar::Number(_)) => "number",
            Value::Scalar(Scalar::Str(_)) => "string",
            Value::List(_) => "list",
            Value::Pair(_, _) => "pair",
            Value::Absent => "absent",
        }
    }
}
