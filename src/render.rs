//! Render tree — converts a result [`Value`] into the `{type, value}`
//! nodes the (out-of-scope) UI renderer consumes.
//!
//! The renderer labels a pair's children "Left"/"Right" and a list's
//! children by index, so the conversion must preserve the distinction
//! between a structural `Pair` and an arbitrary-length `List` — a pair
//! is never flattened into a two-element list.

use serde::Serialize;

use crate::value::{Scalar, Value};

/// One node of the response tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum RenderNode {
    Email(String),
    Html(String),
    Text(String),
    Url(String),
    Number(f64),
    String(String),
    Pair(Box<RenderNode>, Box<RenderNode>),
    List(Vec<RenderNode>),
    Absent,
}

/// Render a top-level result: a list becomes one node per element
/// (absent elements were already dropped during evaluation), an absent
/// result becomes an empty response.
pub fn render_response(value: Value) -> Vec<RenderNode> {
    match value {
        Value::Absent => Vec::new(),
        Value::List(items) => items.into_iter().map(render_node).collect(),
        other => vec![render_node(other)],
    }
}

/// Render a single value.
pub fn render_node(value: Value) -> RenderNode {
    match value {
        Value::Scalar(scalar) => match scalar {
            // emails render as their id; the UI fetches details itself
            Scalar::Email(email) => RenderNode::Email(email.id.clone()),
            Scalar::Html(s) => RenderNode::Html(s.to_string()),
            Scalar::Text(s) => RenderNode::Text(s.to_string()),
            Scalar::Url(url) => RenderNode::Url(url.to_string()),
            Scalar::Number(n) => RenderNode::Number(n),
            Scalar::Str(s) => RenderNode::String(s.to_string()),
        },
        Value::Pair(left, right) => {
            RenderNode::Pair(Box::new(render_node(*left)), Box::new(render_node(*right)))
        }
        Value::List(items) => RenderNode::List(items.into_iter().map(render_node).collect()),
        Value::Absent => RenderNode::Absent,
    }
}
