//! Line-oriented script compiler.
//!
//! Grammar, line by line:
//! - blank lines are skipped; lines made only of `{` / `}` characters
//!   are structural (this covers the common `}{` between two blocks);
//! - a content line is `<Name>[ <argumentText>]`, optionally ending
//!   with a trailing `{` that opens a block immediately;
//! - argument text matching `-?digits[.digits]` exactly becomes a
//!   numeric scalar, anything else stays verbatim as a string (the
//!   fallback is silent);
//! - the reserved name `Additional` emits no node: its argument is
//!   appended to the most recently emitted node;
//! - a name the registry knows as a combinator with block arity *k*
//!   consumes exactly *k* `{ … }` blocks.
//!
//! Parsing threads an explicit cursor (`Parser { tokens, pos }`)
//! through recursive block parses — one forward pass, no backtracking.

use std::sync::LazyLock;

use regex::Regex;

use crate::action::{ActionArgs, ActionNode, ArgValue};
use crate::engine::registry::Registry;
use crate::error::CompileError;

static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("numeric literal pattern"));

/// Reserved continuation keyword — extends the previous node's
/// arguments instead of emitting a node.
const CONTINUATION: &str = "Additional";

/// Compile a script into an action tree. The registry supplies block
/// arities for combinator names.
pub fn compile(source: &str, registry: &Registry) -> Result<Vec<ActionNode>, CompileError> {
    let tokens = tokenize(source);
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_sequence(registry, None)
}

// ── Tokens ──────────────────────────────────────────────────────────

#[derive(Debug)]
enum Token<'a> {
    Open { line: usize },
    Close { line: usize },
    Content { name: &'a str, arg: Option<&'a str>, line: usize },
}

impl Token<'_> {
    fn line(&self) -> usize {
        match self {
            Token::Open { line } | Token::Close { line } | Token::Content { line, .. } => *line,
        }
    }
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Structural-only line: any run of braces, e.g. "{", "}", "}{".
        if trimmed.chars().all(|c| c == '{' || c == '}') {
            for c in trimmed.chars() {
                tokens.push(match c {
                    '{' => Token::Open { line },
                    _ => Token::Close { line },
                });
            }
            continue;
        }

        // Content line, possibly with a trailing block opener.
        let (content, opens_block) = match trimmed.strip_suffix('{') {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };
        let (name, arg) = match content.split_once(' ') {
            Some((name, rest)) => (name, Some(rest)),
            None => (content, None),
        };
        tokens.push(Token::Content { name, arg, line });
        if opens_block {
            tokens.push(Token::Open { line });
        }
    }
    tokens
}

// ── Parser ──────────────────────────────────────────────────────────

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl Parser<'_> {
    /// Parse a sequence of actions. `open_line` is `Some` inside a
    /// block (the line that opened it) and `None` at the top level.
    fn parse_sequence(
        &mut self,
        registry: &Registry,
        open_line: Option<usize>,
    ) -> Result<Vec<ActionNode>, CompileError> {
        let mut nodes: Vec<ActionNode> = Vec::new();

        loop {
            match self.tokens.get(self.pos) {
                None => {
                    return match open_line {
                        Some(line) => Err(CompileError::UnclosedBlock { line }),
                        None => Ok(nodes),
                    };
                }
                Some(Token::Close { line }) => {
                    let line = *line;
                    if open_line.is_none() {
                        return Err(CompileError::UnmatchedClose { line });
                    }
                    self.pos += 1;
                    return Ok(nodes);
                }
                Some(Token::Open { line }) => {
                    // Blocks are only consumed right after a combinator
                    // name; one showing up here belongs to nothing.
                    return Err(CompileError::UnexpectedBlock { line: *line });
                }
                Some(Token::Content { name, arg, line }) => {
                    let (name, arg, line) = (*name, *arg, *line);
                    self.pos += 1;

                    if name == CONTINUATION {
                        let value =
                            arg.map(parse_argument).ok_or(CompileError::EmptyAdditional { line })?;
                        let last = nodes
                            .last_mut()
                            .ok_or(CompileError::DanglingAdditional { line })?;
                        if matches!(last.arguments, Some(ActionArgs::Blocks(_))) {
                            return Err(CompileError::AdditionalAfterCombinator {
                                name: last.name.clone(),
                                line,
                            });
                        }
                        last.append_argument(value);
                        continue;
                    }

                    let mut node = ActionNode {
                        name: name.to_string(),
                        arguments: arg.map(|a| ActionArgs::Scalar(parse_argument(a))),
                    };

                    if let Some(arity) = registry.combinator_arity(name) {
                        if arity > 0 {
                            node.arguments = Some(ActionArgs::Blocks(
                                self.parse_blocks(registry, name, arity, line)?,
                            ));
                        }
                    }
                    nodes.push(node);
                }
            }
        }
    }

    /// Consume exactly `arity` consecutive `{ … }` blocks.
    fn parse_blocks(
        &mut self,
        registry: &Registry,
        name: &str,
        arity: usize,
        name_line: usize,
    ) -> Result<Vec<Vec<ActionNode>>, CompileError> {
        let mut blocks = Vec::with_capacity(arity);
        for found in 0..arity {
            match self.tokens.get(self.pos) {
                Some(Token::Open { line }) => {
                    let line = *line;
                    self.pos += 1;
                    blocks.push(self.parse_sequence(registry, Some(line))?);
                }
                other => {
                    return Err(CompileError::MissingBlock {
                        name: name.to_string(),
                        expected: arity,
                        found,
                        line: other.map(Token::line).unwrap_or(name_line),
                    });
                }
            }
        }
        Ok(blocks)
    }
}

/// Numeric literal or verbatim string; the ambiguity never raises.
fn parse_argument(text: &str) -> ArgValue {
    if NUMERIC_LITERAL.is_match(text) {
        if !text.contains('.') {
            if let Ok(n) = text.parse::<i64>() {
                return ArgValue::int(n);
            }
        }
        // decimals, and integers too large for i64, carry as floats
        if let Some(n) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return ArgValue::Number(n);
        }
    }
    ArgValue::text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_ok(source: &str) -> Vec<ActionNode> {
        compile(source, &Registry::with_standard_actions()).unwrap()
    }

    fn compile_err(source: &str) -> CompileError {
        compile(source, &Registry::with_standard_actions()).unwrap_err()
    }

    #[test]
    fn simple_pipeline() {
        let nodes = compile_ok("EmailToHtml\nUrlToText\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], ActionNode::bare("EmailToHtml"));
        assert_eq!(nodes[1], ActionNode::bare("UrlToText"));
    }

    #[test]
    fn string_argument_keeps_internal_spaces() {
        let nodes = compile_ok("TextFilterRegex foo  bar");
        assert_eq!(
            nodes[0].arguments,
            Some(ActionArgs::Scalar(ArgValue::text("foo  bar")))
        );
    }

    #[test]
    fn numeric_argument_is_numeric() {
        let nodes = compile_ok("UrlGetSegment -1");
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap(),
            json!({"name": "UrlGetSegment", "arguments": -1})
        );
    }

    #[test]
    fn decimal_and_near_numeric_arguments() {
        let nodes = compile_ok("TextFilterRegex 1.5");
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap()["arguments"],
            json!(1.5)
        );
        // not an exact numeric literal → verbatim string, silently
        let nodes = compile_ok("TextFilterRegex 1.5.3");
        assert_eq!(
            nodes[0].arguments,
            Some(ActionArgs::Scalar(ArgValue::text("1.5.3")))
        );
        let nodes = compile_ok("TextFilterRegex -");
        assert_eq!(
            nodes[0].arguments,
            Some(ActionArgs::Scalar(ArgValue::text("-")))
        );
    }

    #[test]
    fn integer_wider_than_i64_is_still_numeric() {
        let nodes = compile_ok("TextFilterRegex 99999999999999999999");
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap()["arguments"],
            json!(1e20)
        );
    }

    #[test]
    fn pair_with_inline_and_shared_braces() {
        let nodes = compile_ok("Pair {\nEmailGetAttr FromAddress\n}{\nEmailToHtml\n}\n");
        assert_eq!(
            serde_json::to_value(&nodes).unwrap(),
            json!([{
                "name": "Pair",
                "arguments": [
                    [{"name": "EmailGetAttr", "arguments": "FromAddress"}],
                    [{"name": "EmailToHtml"}]
                ]
            }])
        );
    }

    #[test]
    fn standalone_open_brace_lines_work_too() {
        let inline = compile_ok("Or {\nEmailToHtml\n}{\nEmailToHtml\n}");
        let standalone = compile_ok("Or\n{\nEmailToHtml\n}\n{\nEmailToHtml\n}");
        assert_eq!(inline, standalone);
    }

    #[test]
    fn additional_extends_previous_node() {
        let nodes = compile_ok("TextMatchRegex foo\nAdditional bar");
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap(),
            json!({"name": "TextMatchRegex", "arguments": ["foo", "bar"]})
        );
    }

    #[test]
    fn additional_three_times_keeps_appending() {
        let nodes = compile_ok("TextMatchRegex a\nAdditional b\nAdditional -3");
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap()["arguments"],
            json!(["a", "b", -3])
        );
    }

    #[test]
    fn additional_onto_bare_node_becomes_sole_argument() {
        let nodes = compile_ok("EmailToHtml\nAdditional x");
        assert_eq!(
            nodes[0].arguments,
            Some(ActionArgs::Scalar(ArgValue::text("x")))
        );
    }

    #[test]
    fn nested_combinators() {
        let source = "Pair {\nPair {\nEmailToHtml\n}{\nEmailToHtml\n}\n}{\nEmailToHtml\n}";
        let nodes = compile_ok(source);
        let outer = nodes[0].arguments.as_ref().unwrap().blocks().unwrap();
        assert_eq!(outer[0][0].name, "Pair");
        assert!(outer[0][0].arguments.as_ref().unwrap().blocks().is_some());
    }

    #[test]
    fn filter_consumes_two_blocks() {
        let nodes = compile_ok("Filter {\nTextFilterRegex x\n}{\nTextToUrl\n}");
        let blocks = nodes[0].arguments.as_ref().unwrap().blocks().unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn unclosed_block_reports_opening_line() {
        assert_eq!(
            compile_err("Pair {\nEmailToHtml\n"),
            CompileError::UnclosedBlock { line: 1 }
        );
    }

    #[test]
    fn unmatched_close_is_an_error() {
        assert_eq!(
            compile_err("EmailToHtml\n}\n"),
            CompileError::UnmatchedClose { line: 2 }
        );
    }

    #[test]
    fn missing_second_block_is_an_error() {
        let err = compile_err("Pair {\nEmailToHtml\n}\nEmailToHtml");
        assert_eq!(
            err,
            CompileError::MissingBlock {
                name: "Pair".into(),
                expected: 2,
                found: 1,
                line: 4
            }
        );
    }

    #[test]
    fn block_after_primitive_is_an_error() {
        assert_eq!(
            compile_err("EmailToHtml {\n}\n"),
            CompileError::UnexpectedBlock { line: 1 }
        );
    }

    #[test]
    fn dangling_additional_is_an_error() {
        assert_eq!(
            compile_err("Additional x"),
            CompileError::DanglingAdditional { line: 1 }
        );
    }

    #[test]
    fn additional_after_combinator_is_an_error() {
        let err = compile_err("Pair {\nEmailToHtml\n}{\nEmailToHtml\n}\nAdditional x");
        assert_eq!(
            err,
            CompileError::AdditionalAfterCombinator {
                name: "Pair".into(),
                line: 6
            }
        );
    }

    #[test]
    fn additional_without_argument_is_an_error() {
        assert_eq!(
            compile_err("EmailToHtml\nAdditional"),
            CompileError::EmptyAdditional { line: 2 }
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let nodes = compile_ok("\n\nEmailToHtml\n\n\nUrlToText\n");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn unknown_names_compile_as_primitive_nodes() {
        // the compiler only needs arity knowledge; unknown names are
        // caught later by registry validation
        let nodes = compile_ok("HtmlSelectCss a.tracking");
        assert_eq!(nodes[0].name, "HtmlSelectCss");
        assert_eq!(
            nodes[0].arguments,
            Some(ActionArgs::Scalar(ArgValue::text("a.tracking")))
        );
    }
}
