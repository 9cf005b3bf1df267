//! Action-tree wire types — nodes, arguments, named macros.
//!
//! These are the shapes exchanged with surrounding systems: an action
//! node is `{name, arguments?}` where `arguments`
//! is either scalar data (for primitives) or a sequence of blocks, each
//! block a sub-pipeline (for combinators).

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One step in a pipeline — a primitive transform or a combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<ActionArgs>,
}

impl ActionNode {
    /// An action with no arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    /// An action with a single scalar argument.
    pub fn with_arg(name: impl Into<String>, arg: ArgValue) -> Self {
        Self {
            name: name.into(),
            arguments: Some(ActionArgs::Scalar(arg)),
        }
    }

    /// A combinator with its argument blocks.
    pub fn with_blocks(name: impl Into<String>, blocks: Vec<Vec<ActionNode>>) -> Self {
        Self {
            name: name.into(),
            arguments: Some(ActionArgs::Blocks(blocks)),
        }
    }

    /// Append a scalar argument, as the script compiler's `Additional`
    /// continuation does: no argument becomes the sole scalar, a scalar
    /// is promoted to a sequence, a sequence grows by one.
    ///
    /// Callers must not invoke this on a node holding blocks; the
    /// compiler rejects that form before getting here.
    pub fn append_argument(&mut self, value: ArgValue) {
        self.arguments = Some(match self.arguments.take() {
            None => ActionArgs::Scalar(value),
            Some(ActionArgs::Scalar(first)) => ActionArgs::Many(vec![first, value]),
            Some(ActionArgs::Many(mut items)) => {
                items.push(value);
                ActionArgs::Many(items)
            }
            Some(blocks @ ActionArgs::Blocks(_)) => blocks,
        });
    }
}

/// Arguments of an action node.
///
/// Untagged on the wire: a lone scalar, a sequence of scalars, or a
/// sequence of blocks. Scalar forms are tried first so `["foo", "bar"]`
/// deserializes as arguments, not as blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionArgs {
    Scalar(ArgValue),
    Many(Vec<ArgValue>),
    Blocks(Vec<Vec<ActionNode>>),
}

impl ActionArgs {
    /// Scalar argument at position `index`, if this is scalar-shaped.
    pub fn scalar(&self, index: usize) -> Option<&ArgValue> {
        match self {
            ActionArgs::Scalar(value) if index == 0 => Some(value),
            ActionArgs::Scalar(_) => None,
            ActionArgs::Many(items) => items.get(index),
            ActionArgs::Blocks(_) => None,
        }
    }

    /// The argument blocks, if this is block-shaped.
    pub fn blocks(&self) -> Option<&[Vec<ActionNode>]> {
        match self {
            ActionArgs::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }
}

/// A scalar argument: numeric literal or verbatim text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Number(Number),
    Text(String),
}

impl ArgValue {
    pub fn text(s: impl Into<String>) -> Self {
        ArgValue::Text(s.into())
    }

    pub fn int(n: i64) -> Self {
        ArgValue::Number(Number::from(n))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            ArgValue::Number(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Number(n) => n.as_i64(),
            ArgValue::Text(_) => None,
        }
    }
}

/// A named, ordered pipeline of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub name: String,
    pub actions: Vec<ActionNode>,
}

/// A request to run an ad-hoc pipeline against an input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub actions: Vec<ActionNode>,
}
