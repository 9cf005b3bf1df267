//! End-to-end tests for the pipeline engine: compile a textual script,
//! evaluate it against an email-derived value, render the response.
//!
//! A stub host primitive (`HtmlFindLinks`) stands in for the external
//! HTML collaborator to exercise the registry's injection seam.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use mailsift::action::{ActionArgs, ActionNode, ArgValue, ExecutionRequest};
use mailsift::config::MacroConfig;
use mailsift::engine::{Engine, Registry};
use mailsift::error::PrimitiveError;
use mailsift::primitives::Primitive;
use mailsift::render::RenderNode;
use mailsift::value::{Email, Scalar, Value};

/// Stand-in for the host's HTML collaborator: pulls every `href` out
/// of an HTML fragment as text. Real deployments inject a CSS-selector
/// primitive here instead.
struct HtmlFindLinks;

impl Primitive for HtmlFindLinks {
    fn name(&self) -> &'static str {
        "HtmlFindLinks"
    }

    fn apply(&self, input: &Value, _args: Option<&ActionArgs>) -> Result<Value, PrimitiveError> {
        let Value::Scalar(Scalar::Html(html)) = input else {
            return Ok(Value::Absent);
        };
        let regex = regex::Regex::new(r#"href="([^"]+)""#)
            .map_err(|e| PrimitiveError::fatal(e.to_string()))?;
        let links: Vec<Value> = regex
            .captures_iter(html)
            .map(|cap| Value::text(cap[1].to_string()))
            .collect();
        if links.is_empty() {
            Ok(Value::Absent)
        } else {
            Ok(Value::List(links))
        }
    }
}

fn shipping_email() -> Value {
    Value::email(Email {
        id: "msg-7".into(),
        from_address: "orders@shop.example".into(),
        to_address: "me@example.com".into(),
        subject: "Your order has shipped".into(),
        html: Some(
            r#"<p>Track your parcels:</p>
               <a href="https://carrier.example/t?track=AB123">first</a>
               <a href="https://carrier.example/t?track=CD456">second</a>"#
                .into(),
        ),
        received_at: Utc::now(),
    })
}

fn test_engine() -> Engine {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut registry = Registry::with_standard_actions();
    registry.register(Arc::new(HtmlFindLinks));
    Engine::new(registry)
}

#[test]
fn script_to_render_tree_roundtrip() {
    let engine = test_engine();
    let script = "\
Pair {
EmailGetAttr FromAddress
}{
EmailToHtml
HtmlFindLinks
TextToUrl
UrlGetQuery track
}
PairDistributeLeft
";
    let actions = engine.compile(script).unwrap();
    let request = ExecutionRequest { actions };
    let response = engine.execute(&request, shipping_email()).unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!([
            {"type": "Pair", "value": [
                {"type": "Text", "value": "orders@shop.example"},
                {"type": "Text", "value": "AB123"}
            ]},
            {"type": "Pair", "value": [
                {"type": "Text", "value": "orders@shop.example"},
                {"type": "Text", "value": "CD456"}
            ]}
        ])
    );
}

#[test]
fn zip_pairs_links_with_their_codes() {
    let engine = test_engine();
    let script = "\
Pair {
EmailToHtml
HtmlFindLinks
TextToUrl
UrlToText
}{
EmailToHtml
HtmlFindLinks
TextMatchRegex track=([A-Z0-9]+)
Additional $1
}
PairZipTogether
";
    let actions = engine.compile(script).unwrap();
    let result = engine.evaluate(&actions, shipping_email()).unwrap();

    // Left: list of link urls. Right: nested match lists, one per link.
    // Zip truncates to the shorter side and pairs positionally.
    let Value::List(pairs) = result else {
        panic!("expected a list, got {result:?}");
    };
    assert_eq!(pairs.len(), 2);
    assert_eq!(
        pairs[0],
        Value::pair(
            Value::text("https://carrier.example/t?track=AB123"),
            Value::List(vec![Value::text("AB123")]),
        )
    );
}

#[test]
fn filter_keeps_only_matching_links() {
    let engine = test_engine();
    let script = "\
EmailToHtml
HtmlFindLinks
Filter {
TextFilterRegex AB
}{
TextToUrl
UrlGetQuery track
}
";
    let actions = engine.compile(script).unwrap();
    let result = engine.evaluate(&actions, shipping_email()).unwrap();
    assert_eq!(result, Value::List(vec![Value::text("AB123")]));
}

#[test]
fn or_falls_back_when_first_pipeline_finds_nothing() {
    let engine = test_engine();
    let script = "\
Or {
EmailGetAttr Subject
TextMatchRegex invoice #(\\d+)
Additional $1
}{
EmailGetAttr FromAddress
}
";
    let actions = engine.compile(script).unwrap();
    let result = engine.evaluate(&actions, shipping_email()).unwrap();
    // no invoice number in the subject → fall back to the sender
    assert_eq!(result, Value::text("orders@shop.example"));
}

#[test]
fn macro_library_loads_and_expands() {
    let mut engine = test_engine();
    let config = MacroConfig::from_json(
        r#"{"macros": [
            {"name": "tracking-codes",
             "script": "EmailToHtml\nHtmlFindLinks\nTextToUrl\nUrlGetQuery track\n"},
            {"name": "sender",
             "actions": [{"name": "EmailGetAttr", "arguments": "FromAddress"}]}
        ]}"#,
    )
    .unwrap();
    let macros = config.into_macros(engine.registry()).unwrap();
    engine.add_macros(macros).unwrap();

    let actions = vec![ActionNode::with_arg("Macro", ArgValue::text("tracking-codes"))];
    let result = engine.evaluate(&actions, shipping_email()).unwrap();
    assert_eq!(
        result,
        Value::List(vec![Value::text("AB123"), Value::text("CD456")])
    );

    let sender = engine.run_macro("sender", shipping_email()).unwrap();
    assert_eq!(sender, Value::text("orders@shop.example"));
}

#[test]
fn broadcast_runs_whole_pipelines_per_email() {
    let engine = test_engine();
    let other = Value::email(Email {
        id: "msg-8".into(),
        from_address: "friend@example.com".into(),
        to_address: "me@example.com".into(),
        subject: "lunch?".into(),
        html: None,
        received_at: Utc::now(),
    });
    let inbox = Value::List(vec![shipping_email(), other]);

    let actions = engine
        .compile("EmailFilterRegex FromAddress\nAdditional @shop\\.example$\nEmailGetAttr Subject\n")
        .unwrap();
    let result = engine.evaluate(&actions, inbox).unwrap();
    // the non-matching email dropped out at the filter step
    assert_eq!(
        result,
        Value::List(vec![Value::text("Your order has shipped")])
    );
}

#[test]
fn execute_renders_absent_as_empty_response() {
    let engine = test_engine();
    let request = ExecutionRequest {
        actions: vec![ActionNode::with_arg(
            "EmailFilterRegex",
            ArgValue::text("Subject"),
        )],
    };
    // invalid arguments are caught by validation before evaluation
    assert!(engine.execute(&request, shipping_email()).is_err());

    let request = ExecutionRequest {
        actions: engine.compile("EmailGetAttr Subject\nTextToUrl\n").unwrap(),
    };
    let response = engine.execute(&request, shipping_email()).unwrap();
    assert!(response.is_empty());
}

#[test]
fn render_preserves_pair_versus_list_shape() {
    let engine = test_engine();
    let actions = engine
        .compile("Pair {\nEmailGetAttr Subject\n}{\nEmailGetAttr FromAddress\n}\n")
        .unwrap();
    let response = engine
        .execute(&ExecutionRequest { actions }, shipping_email())
        .unwrap();
    assert_eq!(response.len(), 1);
    assert!(matches!(response[0], RenderNode::Pair(_, _)));
}
