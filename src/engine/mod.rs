//! Engine façade — compile scripts, resolve macros, evaluate pipelines,
//! render results.

pub mod eval;
pub mod registry;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::action::{ActionArgs, ActionNode, ExecutionRequest, Macro};
use crate::error::{CompileError, Error, RegistryError};
use crate::render::{self, RenderNode};
use crate::script;
use crate::value::Value;

pub use eval::Evaluator;
pub use registry::{ActionKind, Combinator, Registry};

// ── Macro library ───────────────────────────────────────────────────

/// Named macros available for `Macro` reference nodes.
#[derive(Default)]
pub struct MacroLibrary {
    macros: HashMap<String, Vec<ActionNode>>,
}

impl MacroLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named macro.
    pub fn insert(&mut self, mac: Macro) {
        debug!(name = %mac.name, actions = mac.actions.len(), "Registered macro");
        self.macros.insert(mac.name, mac.actions);
    }

    pub fn get(&self, name: &str) -> Option<&[ActionNode]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    /// Expand every `Macro` reference node (including inside combinator
    /// blocks) into the referenced pipeline's actions, spliced in place.
    /// Unknown names and reference cycles are rejected — the resolved
    /// tree is always finite and acyclic.
    pub fn resolve(&self, actions: &[ActionNode]) -> Result<Vec<ActionNode>, RegistryError> {
        let mut stack = Vec::new();
        self.resolve_sequence(actions, &mut stack)
    }

    fn resolve_sequence(
        &self,
        actions: &[ActionNode],
        stack: &mut Vec<String>,
    ) -> Result<Vec<ActionNode>, RegistryError> {
        let mut resolved = Vec::with_capacity(actions.len());
        for node in actions {
            if node.name == "Macro" {
                let name = node
                    .arguments
                    .as_ref()
                    .and_then(|a| a.scalar(0))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| RegistryError::InvalidArgument {
                        name: node.name.clone(),
                        message: "macro reference needs a macro name".into(),
                    })?;
                let body = self
                    .get(name)
                    .ok_or_else(|| RegistryError::UnknownMacro { name: name.into() })?;
                if stack.iter().any(|n| n == name) {
                    return Err(RegistryError::RecursiveMacro { name: name.into() });
                }
                stack.push(name.to_string());
                resolved.extend(self.resolve_sequence(body, stack)?);
                stack.pop();
            } else if let Some(ActionArgs::Blocks(blocks)) = &node.arguments {
                let blocks = blocks
                    .iter()
                    .map(|block| self.resolve_sequence(block, stack))
                    .collect::<Result<Vec<_>, _>>()?;
                resolved.push(ActionNode {
                    name: node.name.clone(),
                    arguments: Some(ActionArgs::Blocks(blocks)),
                });
            } else {
                resolved.push(node.clone());
            }
        }
        Ok(resolved)
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Ties a registry and a macro library together behind the operations
/// the surrounding system calls: compile a script, evaluate a pipeline,
/// execute a request into render nodes.
///
/// Immutable after construction, so one `Engine` can serve concurrent
/// evaluations without coordination.
pub struct Engine {
    registry: Registry,
    macros: MacroLibrary,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            macros: MacroLibrary::new(),
        }
    }

    /// An engine with the standard action set and no macros.
    pub fn with_standard_actions() -> Self {
        Self::new(Registry::with_standard_actions())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Add a named macro, validating its body first.
    pub fn add_macro(&mut self, mac: Macro) -> Result<(), RegistryError> {
        self.registry.validate(&mac.actions)?;
        self.macros.insert(mac);
        Ok(())
    }

    pub fn add_macros(&mut self, macros: Vec<Macro>) -> Result<(), RegistryError> {
        for mac in macros {
            self.add_macro(mac)?;
        }
        Ok(())
    }

    /// Compile a textual macro script into an action tree.
    pub fn compile(&self, source: &str) -> Result<Vec<ActionNode>, CompileError> {
        script::compile(source, &self.registry)
    }

    /// Evaluate a pipeline against an input value: resolve macro
    /// references, validate, then run the tree-walk.
    pub fn evaluate(&self, actions: &[ActionNode], input: Value) -> Result<Value, Error> {
        let resolved = self.macros.resolve(actions)?;
        self.registry.validate(&resolved)?;
        let result = Evaluator::new(&self.registry).evaluate(&resolved, input)?;
        Ok(result)
    }

    /// Run a named macro from the library.
    pub fn run_macro(&self, name: &str, input: Value) -> Result<Value, Error> {
        let actions = self
            .macros
            .get(name)
            .ok_or(RegistryError::UnknownMacro { name: name.into() })?
            .to_vec();
        self.evaluate(&actions, input)
    }

    /// Execute an ad-hoc request and render the result for display.
    pub fn execute(
        &self,
        request: &ExecutionRequest,
        input: Value,
    ) -> Result<Vec<RenderNode>, Error> {
        info!(actions = request.actions.len(), "Executing pipeline");
        let result = self.evaluate(&request.actions, input)?;
        debug!(result = result.kind(), "Pipeline finished");
        Ok(render::render_response(result))
    }
}
