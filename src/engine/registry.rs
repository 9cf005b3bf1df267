//! Action registry — name → primitive or combinator, with load-time
//! validation of action trees.

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::{ActionArgs, ActionNode};
use crate::error::RegistryError;
use crate::primitives::{
    EmailFilterRegex, EmailGetAttr, EmailToHtml, Primitive, TextFilterRegex, TextMatchRegex,
    TextToHtml, TextToUrl, UrlGetQuery, UrlGetSegment, UrlToText,
};

/// Structural combinators implemented by the evaluator itself.
///
/// Closed enum: the evaluator matches exhaustively, so a new combinator
/// forces every site to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Pair,
    Or,
    Filter,
    PairGetLeft,
    PairGetRight,
    PairZipTogether,
    PairDistributeLeft,
    PairSwap,
    ListSelectNth,
    MacroRef,
}

impl Combinator {
    /// Number of `{ … }` blocks the script compiler consumes after the
    /// combinator's name.
    pub fn block_arity(self) -> usize {
        match self {
            Combinator::Pair | Combinator::Or | Combinator::Filter => 2,
            Combinator::PairGetLeft
            | Combinator::PairGetRight
            | Combinator::PairZipTogether
            | Combinator::PairDistributeLeft
            | Combinator::PairSwap
            | Combinator::ListSelectNth
            | Combinator::MacroRef => 0,
        }
    }

    /// Name as written in scripts and wire trees.
    pub fn name(self) -> &'static str {
        match self {
            Combinator::Pair => "Pair",
            Combinator::Or => "Or",
            Combinator::Filter => "Filter",
            Combinator::PairGetLeft => "PairGetLeft",
            Combinator::PairGetRight => "PairGetRight",
            Combinator::PairZipTogether => "PairZipTogether",
            Combinator::PairDistributeLeft => "PairDistributeLeft",
            Combinator::PairSwap => "PairSwap",
            Combinator::ListSelectNth => "ListSelectNth",
            Combinator::MacroRef => "Macro",
        }
    }

    const ALL: &'static [Combinator] = &[
        Combinator::Pair,
        Combinator::Or,
        Combinator::Filter,
        Combinator::PairGetLeft,
        Combinator::PairGetRight,
        Combinator::PairZipTogether,
        Combinator::PairDistributeLeft,
        Combinator::PairSwap,
        Combinator::ListSelectNth,
        Combinator::MacroRef,
    ];
}

/// What a name resolves to.
pub enum ActionKind {
    Primitive(Arc<dyn Primitive>),
    Combinator(Combinator),
}

/// Registry of available actions.
///
/// Built once at startup and immutable during evaluation; hosts inject
/// their primitives (HTML selection, redirect following, …) through
/// [`Registry::register`] before handing the registry to the engine.
pub struct Registry {
    actions: HashMap<String, ActionKind>,
}

impl Registry {
    /// A registry knowing only the structural combinators.
    pub fn new() -> Self {
        let mut actions = HashMap::new();
        for &comb in Combinator::ALL {
            actions.insert(comb.name().to_string(), ActionKind::Combinator(comb));
        }
        Self { actions }
    }

    /// A registry with combinators plus the standard pure primitives.
    pub fn with_standard_actions() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EmailGetAttr));
        registry.register(Arc::new(EmailFilterRegex));
        registry.register(Arc::new(EmailToHtml));
        registry.register(Arc::new(TextMatchRegex));
        registry.register(Arc::new(TextFilterRegex));
        registry.register(Arc::new(TextToHtml));
        registry.register(Arc::new(TextToUrl));
        registry.register(Arc::new(UrlToText));
        registry.register(Arc::new(UrlGetQuery));
        registry.register(Arc::new(UrlGetSegment));
        registry
    }

    /// Register a primitive. Combinator names cannot be shadowed —
    /// such registrations are rejected with a warning.
    pub fn register(&mut self, primitive: Arc<dyn Primitive>) {
        let name = primitive.name();
        if let Some(ActionKind::Combinator(_)) = self.actions.get(name) {
            tracing::warn!(
                action = name,
                "Rejected primitive registration: would shadow a combinator"
            );
            return;
        }
        tracing::debug!(action = name, "Registered primitive");
        self.actions.insert(name.to_string(), ActionKind::Primitive(primitive));
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> Option<&ActionKind> {
        self.actions.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// All registered action names.
    pub fn list(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Block arity for a combinator name; `None` for primitives and
    /// unknown names. The script compiler consults this to know how
    /// many blocks to consume.
    pub fn combinator_arity(&self, name: &str) -> Option<usize> {
        match self.actions.get(name) {
            Some(ActionKind::Combinator(comb)) => Some(comb.block_arity()),
            _ => None,
        }
    }

    /// Validate an action tree before evaluation: every name known,
    /// block counts matching combinator arity, primitive arguments
    /// well-formed. Runs at macro-load time so authoring mistakes never
    /// surface mid-evaluation.
    pub fn validate(&self, actions: &[ActionNode]) -> Result<(), RegistryError> {
        for node in actions {
            match self.actions.get(&node.name) {
                None => {
                    return Err(RegistryError::UnknownAction {
                        name: node.name.clone(),
                    });
                }
                Some(ActionKind::Primitive(primitive)) => {
                    if let Some(ActionArgs::Blocks(blocks)) = &node.arguments {
                        return Err(RegistryError::BlockArity {
                            name: node.name.clone(),
                            expected: 0,
                            found: blocks.len(),
                        });
                    }
                    primitive.check_args(node.arguments.as_ref())?;
                }
                Some(ActionKind::Combinator(comb)) => {
                    self.validate_combinator(*comb, node)?;
                }
            }
        }
        Ok(())
    }

    fn validate_combinator(
        &self,
        comb: Combinator,
        node: &ActionNode,
    ) -> Result<(), RegistryError> {
        let expected = comb.block_arity();
        let blocks = node.arguments.as_ref().and_then(ActionArgs::blocks);
        let found = blocks.map(<[_]>::len).unwrap_or(0);
        if found != expected {
            return Err(RegistryError::BlockArity {
                name: node.name.clone(),
                expected,
                found,
            });
        }
        if let Some(blocks) = blocks {
            for block in blocks {
                self.validate(block)?;
            }
        }

        match comb {
            Combinator::MacroRef => {
                node.arguments
                    .as_ref()
                    .and_then(|a| a.scalar(0))
                    .and_then(|v| v.as_str())
                    .map(|_| ())
                    .ok_or_else(|| RegistryError::InvalidArgument {
                        name: node.name.clone(),
                        message: "macro reference needs a macro name".into(),
                    })
            }
            Combinator::ListSelectNth => {
                let index = node
                    .arguments
                    .as_ref()
                    .and_then(|a| a.scalar(0))
                    .and_then(|v| v.as_i64());
                match index {
                    Some(n) if n >= 0 => Ok(()),
                    Some(_) => Err(RegistryError::InvalidArgument {
                        name: node.name.clone(),
                        message: "index must be non-negative".into(),
                    }),
                    None => Err(RegistryError::InvalidArgument {
                        name: node.name.clone(),
                        message: "needs an integer index".into(),
                    }),
                }
            }
            _ => Ok(()),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ArgValue;
    use crate::error::PrimitiveError;
    use crate::value::Value;

    struct ShadowAttempt;
    impl Primitive for ShadowAttempt {
        fn name(&self) -> &'static str {
            "Pair"
        }
        fn apply(
            &self,
            _input: &Value,
            _args: Option<&ActionArgs>,
        ) -> Result<Value, PrimitiveError> {
            Ok(Value::Absent)
        }
    }

    #[test]
    fn combinators_are_preregistered() {
        let registry = Registry::new();
        assert!(registry.has("Pair"));
        assert!(registry.has("PairZipTogether"));
        assert_eq!(registry.combinator_arity("Filter"), Some(2));
        assert_eq!(registry.combinator_arity("PairGetLeft"), Some(0));
    }

    #[test]
    fn standard_actions_include_primitives() {
        let registry = Registry::with_standard_actions();
        assert!(registry.has("EmailGetAttr"));
        assert!(registry.has("UrlGetSegment"));
        assert_eq!(registry.combinator_arity("EmailGetAttr"), None);
    }

    #[test]
    fn combinator_names_cannot_be_shadowed() {
        let mut registry = Registry::new();
        registry.register(Arc::new(ShadowAttempt));
        assert!(matches!(
            registry.get("Pair"),
            Some(ActionKind::Combinator(Combinator::Pair))
        ));
    }

    #[test]
    fn validate_rejects_unknown_action() {
        let registry = Registry::with_standard_actions();
        let err = registry
            .validate(&[ActionNode::bare("HtmlEatCss")])
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownAction {
                name: "HtmlEatCss".into()
            }
        );
    }

    #[test]
    fn validate_rejects_block_arity_mismatch() {
        let registry = Registry::new();
        let node = ActionNode::with_blocks("Pair", vec![vec![]]);
        let err = registry.validate(&[node]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::BlockArity {
                name: "Pair".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn validate_recurses_into_blocks() {
        let registry = Registry::with_standard_actions();
        let node = ActionNode::with_blocks(
            "Pair",
            vec![vec![ActionNode::bare("NoSuchAction")], vec![]],
        );
        assert!(matches!(
            registry.validate(&[node]),
            Err(RegistryError::UnknownAction { .. })
        ));
    }

    #[test]
    fn validate_rejects_blocks_on_primitive() {
        let registry = Registry::with_standard_actions();
        let node = ActionNode::with_blocks("EmailToHtml", vec![vec![]]);
        assert!(matches!(
            registry.validate(&[node]),
            Err(RegistryError::BlockArity { .. })
        ));
    }

    #[test]
    fn validate_checks_primitive_arguments() {
        let registry = Registry::with_standard_actions();
        let node = ActionNode::with_arg("TextFilterRegex", ArgValue::text("("));
        assert!(matches!(
            registry.validate(&[node]),
            Err(RegistryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn validate_checks_select_nth_index() {
        let registry = Registry::new();
        let negative = ActionNode::with_arg("ListSelectNth", ArgValue::int(-2));
        assert!(registry.validate(&[negative]).is_err());
        let missing = ActionNode::bare("ListSelectNth");
        assert!(registry.validate(&[missing]).is_err());
        let ok = ActionNode::with_arg("ListSelectNth", ArgValue::int(0));
        assert!(registry.validate(&[ok]).is_ok());
    }

    #[test]
    fn validate_requires_macro_name() {
        let registry = Registry::new();
        assert!(registry.validate(&[ActionNode::bare("Macro")]).is_err());
        let named = ActionNode::with_arg("Macro", ArgValue::text("tracking-number"));
        assert!(registry.validate(&[named]).is_ok());
    }
}
