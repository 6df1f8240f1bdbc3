//! Integration tests for reference checking: parser → reachability → schema.

mod helpers;

use flowcheck::error::ErrorKind;
use flowcheck::parse::{FieldType, FlowGraph};
use flowcheck::reference::{Classified, classify, extract_references};
use flowcheck::validate::Validator;
use helpers::*;

/// Trigger with `amount: number` feeding `a1`; `side` hangs off the trigger too.
fn amount_flow() -> FlowGraph {
    let doc = document(
        vec![
            trigger("t1", &[("amount", FieldType::Number, true)]),
            action("a1"),
            action("side"),
        ],
        vec![edge("t1", "a1"), edge("t1", "side")],
    );
    FlowGraph::build(&doc).unwrap()
}

#[test]
fn text_without_braces_has_no_references() {
    let graph = amount_flow();
    for text in ["", "plain", "single { brace }", "steps.trigger.body.amount"] {
        assert!(extract_references(text).is_empty());
        assert!(Validator::default().validate_text(&graph, "a1", text).is_empty());
    }
}

#[test]
fn well_formed_trigger_field_passes() {
    let graph = amount_flow();
    let errors =
        Validator::default().validate_text(&graph, "a1", "{{ steps.trigger.body.amount }}");
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn stray_spaces_are_a_syntax_error() {
    let graph = amount_flow();
    let errors =
        Validator::default().validate_text(&graph, "a1", "{{ steps. trigger .body.amount }}");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Syntax);
    assert_eq!(errors[0].code, "R001");
}

#[test]
fn other_namespaces_are_ignored() {
    assert_eq!(classify(" vars.x "), Classified::Ignored);
    assert_eq!(classify("42"), Classified::Ignored);
    let graph = amount_flow();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ now }} {{ 'x' }}");
    assert!(errors.is_empty());
}

#[test]
fn unknown_node_yields_one_topology_error() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(
        &graph,
        "a1",
        "{{ steps.trigger.body.amount }} {{ steps.unknownNode.body.x }}",
    );
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert_eq!(errors[0].kind, ErrorKind::Topology);
    assert!(errors[0].message.contains("unknownNode"));
}

#[test]
fn sibling_branch_is_not_upstream() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ steps.side }}");
    assert_eq!(codes(&errors), vec!["R002"]);
}

#[test]
fn self_reference_is_allowed() {
    let graph = amount_flow();
    assert!(Validator::default().validate_text(&graph, "a1", "{{ steps.a1 }}").is_empty());
}

#[test]
fn undeclared_trigger_field_is_a_schema_error() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ steps.trigger.body.other }}");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Schema);
    assert!(errors[0].message.contains("other"));
}

#[test]
fn literal_trigger_id_is_schema_checked() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ steps.t1.body.other }}");
    assert_eq!(codes(&errors), vec!["R003"]);
}

#[test]
fn non_trigger_fields_are_not_schema_checked() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(
        &graph,
        "a1",
        "{{ steps.t1 }} {{ steps.a1.body.anything }}",
    );
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn topology_and_schema_are_reported_independently() {
    let doc = document(
        vec![
            trigger("t1", &[("amount", FieldType::Number, true)]),
            action("a1"),
            action("orphan"),
        ],
        vec![edge("t1", "a1")],
    );
    let graph = FlowGraph::build(&doc).unwrap();
    let errors =
        Validator::default().validate_text(&graph, "orphan", "{{ steps.trigger.body.nope }}");
    assert_eq!(codes(&errors), vec!["R002", "R003"]);
}

#[test]
fn two_triggers_report_ambiguous_alias() {
    init_tracing();
    let doc = load_fixture(include_str!("fixtures/two_triggers.json"));
    let graph = FlowGraph::build(&doc).unwrap();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ steps.trigger.body.x }}");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Structural);
    assert_eq!(errors[0].code, "R004");

    // The literal id still resolves.
    assert!(Validator::default().validate_text(&graph, "a1", "{{ steps.t1.body.x }}").is_empty());
}

#[test]
fn unclosed_block_is_ignored() {
    let graph = amount_flow();
    let errors = Validator::default().validate_text(&graph, "a1", "{{ steps.side ");
    assert!(errors.is_empty());
}

#[test]
fn validation_is_idempotent_across_threads() {
    let graph = amount_flow();
    let validator = Validator::default();
    let text = "{{ steps.trigger.body.other }} {{ steps.side }} {{ steps.x. }}";
    let expected = validator.validate_text(&graph, "a1", text);
    assert_eq!(expected.len(), 3);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| validator.validate_text(&graph, "a1", text)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
