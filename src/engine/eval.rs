//! Combinator evaluator — a stateless, synchronous, recursive tree-walk.
//!
//! `evaluate(actions, value)` is a pure function of the action tree and
//! the input; no state survives a call and concurrent evaluations never
//! interact. Three rules govern everything:
//!
//! - **Absence propagates**: an action applied to `Absent` yields
//!   `Absent` without being invoked.
//! - **Broadcast**: a scalar/pair-shaped action applied to a `List` is
//!   applied independently per element (recursing through nested
//!   lists); `Absent` results are dropped, order is preserved. The
//!   list-aware combinators (`PairZipTogether`, `PairDistributeLeft`,
//!   `Filter`, `ListSelectNth`) consume the shape directly instead, and
//!   `Pair`/`Or` always see the unmodified input.
//! - **Partial-failure isolation**: a non-fatal primitive failure turns
//!   that element into `Absent`; its siblings are unaffected.

use tracing::debug;

use crate::action::{ActionArgs, ActionNode};
use crate::engine::registry::{ActionKind, Combinator, Registry};
use crate::error::{EvalError, RegistryError};
use crate::primitives::Primitive;
use crate::value::Value;

/// Evaluates action trees against a registry.
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Run a pipeline: each action transforms the running value in turn.
    pub fn evaluate(&self, actions: &[ActionNode], mut value: Value) -> Result<Value, EvalError> {
        for node in actions {
            if value.is_absent() {
                return Ok(Value::Absent);
            }
            value = self.apply(node, value)?;
        }
        Ok(value)
    }

    /// Apply a single action node.
    fn apply(&self, node: &ActionNode, value: Value) -> Result<Value, EvalError> {
        if value.is_absent() {
            return Ok(Value::Absent);
        }
        match self.registry.get(&node.name) {
            None => Err(RegistryError::UnknownAction {
                name: node.name.clone(),
            }
            .into()),
            Some(ActionKind::Primitive(primitive)) => {
                self.broadcast(value, &|v| self.apply_primitive(node, primitive.as_ref(), v))
            }
            Some(ActionKind::Combinator(comb)) => self.apply_combinator(*comb, node, value),
        }
    }

    /// Element-wise application over lists, recursing through nested
    /// lists, dropping `Absent` results, preserving order.
    fn broadcast(
        &self,
        value: Value,
        f: &dyn Fn(Value) -> Result<Value, EvalError>,
    ) -> Result<Value, EvalError> {
        match value {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let result = self.broadcast(item, f)?;
                    if !result.is_absent() {
                        out.push(result);
                    }
                }
                Ok(Value::List(out))
            }
            Value::Absent => Ok(Value::Absent),
            other => f(other),
        }
    }

    fn apply_primitive(
        &self,
        node: &ActionNode,
        primitive: &dyn Primitive,
        value: Value,
    ) -> Result<Value, EvalError> {
        match primitive.apply(&value, node.arguments.as_ref()) {
            Ok(result) => Ok(result),
            Err(err) if err.fatal => Err(EvalError::Primitive {
                action: node.name.clone(),
                message: err.message,
            }),
            Err(err) => {
                debug!(
                    action = %node.name,
                    input = value.kind(),
                    error = %err,
                    "Primitive failed, substituting absent"
                );
                Ok(Value::Absent)
            }
        }
    }

    fn apply_combinator(
        &self,
        comb: Combinator,
        node: &ActionNode,
        value: Value,
    ) -> Result<Value, EvalError> {
        match comb {
            // Both branches see the same, unmodified input; neither
            // observes the other's result.
            Combinator::Pair => {
                let (first, second) = two_blocks(node)?;
                let left = self.evaluate(first, value.clone())?;
                let right = self.evaluate(second, value)?;
                Ok(Value::pair(left, right))
            }

            // B runs only when A came back absent or empty, and runs
            // against the original input.
            Combinator::Or => {
                let (first, second) = two_blocks(node)?;
                let result = self.evaluate(first, value.clone())?;
                if result.is_vacant() {
                    self.evaluate(second, value)
                } else {
                    Ok(result)
                }
            }

            Combinator::Filter => {
                let (predicate, projection) = two_blocks(node)?;
                match value {
                    Value::List(items) => {
                        let mut kept = Vec::new();
                        for item in items {
                            if self.evaluate(predicate, item.clone())?.is_truthy() {
                                let projected = self.evaluate(projection, item)?;
                                if !projected.is_absent() {
                                    kept.push(projected);
                                }
                            }
                        }
                        Ok(Value::List(kept))
                    }
                    // Degenerate single keep/drop test.
                    other => {
                        if self.evaluate(predicate, other.clone())?.is_truthy() {
                            self.evaluate(projection, other)
                        } else {
                            Ok(Value::Absent)
                        }
                    }
                }
            }

            Combinator::PairGetLeft => self.broadcast(value, &|v| {
                Ok(match v {
                    Value::Pair(left, _) => *left,
                    _ => Value::Absent,
                })
            }),

            Combinator::PairGetRight => self.broadcast(value, &|v| {
                Ok(match v {
                    Value::Pair(_, right) => *right,
                    _ => Value::Absent,
                })
            }),

            Combinator::PairSwap => self.broadcast(value, &|v| {
                Ok(match v {
                    Value::Pair(left, right) => Value::Pair(right, left),
                    _ => Value::Absent,
                })
            }),

            // Positional zip, truncating to the shorter side.
            Combinator::PairZipTogether => Ok(match value {
                Value::Pair(left, right) => match (*left, *right) {
                    (Value::List(xs), Value::List(ys)) => Value::List(
                        xs.into_iter()
                            .zip(ys)
                            .map(|(x, y)| Value::pair(x, y))
                            .collect(),
                    ),
                    _ => Value::Absent,
                },
                _ => Value::Absent,
            }),

            // Left value broadcast unchanged across the right list; a
            // non-list right degenerates to a singleton distribution.
            Combinator::PairDistributeLeft => Ok(match value {
                Value::Pair(left, right) => match *right {
                    Value::List(items) => Value::List(
                        items
                            .into_iter()
                            .map(|item| Value::pair((*left).clone(), item))
                            .collect(),
                    ),
                    other => Value::List(vec![Value::Pair(left, Box::new(other))]),
                },
                _ => Value::Absent,
            }),

            Combinator::ListSelectNth => {
                let index = node
                    .arguments
                    .as_ref()
                    .and_then(|a| a.scalar(0))
                    .and_then(|v| v.as_i64())
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| RegistryError::InvalidArgument {
                        name: node.name.clone(),
                        message: "needs a non-negative integer index".into(),
                    })?;
                Ok(match value {
                    Value::List(items) => items
                        .into_iter()
                        .nth(index as usize)
                        .unwrap_or(Value::Absent),
                    _ => Value::Absent,
                })
            }

            // Macro references are resolved before evaluation; one
            // reaching this point was never expanded.
            Combinator::MacroRef => {
                let name = node
                    .arguments
                    .as_ref()
                    .and_then(|a| a.scalar(0))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                Err(RegistryError::UnknownMacro {
                    name: name.to_string(),
                }
                .into())
            }
        }
    }
}

/// Destructure a combinator's two argument blocks.
fn two_blocks(node: &ActionNode) -> Result<(&[ActionNode], &[ActionNode]), EvalError> {
    match node.arguments.as_ref().and_then(ActionArgs::blocks) {
        Some([first, second]) => Ok((first, second)),
        other => Err(RegistryError::BlockArity {
            name: node.name.clone(),
            expected: 2,
            found: other.map(<[_]>::len).unwrap_or(0),
        }
        .into()),
    }
}
