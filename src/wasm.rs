//! WASM entry points for browser use.
//!
//! Every function takes JSON strings and returns a JS value. An empty
//! `config_json` means the default `EngineConfig`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::analyze::{self, AvailableReference};
use crate::config::EngineConfig;
use crate::error::{ParseError, ValidationError};
use crate::parse::{FlowDocument, FlowGraph};
use crate::validate::Validator;

/// Validate a whole flow document (structure, node configs, references).
/// Returns `{status: "valid"}` or `{status: "invalid", errors: [...]}`.
#[wasm_bindgen]
pub fn validate_flow(flow_json: &str, config_json: &str) -> JsValue {
    let result = validate_flow_inner(flow_json, config_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_flow_inner(flow_json: &str, config_json: &str) -> ValidationResult {
    let (doc, validator) = match load(flow_json, config_json) {
        Ok(loaded) => loaded,
        Err(e) => return ValidationResult::from_parse(e),
    };
    ValidationResult::from_errors(validator.validate_document(&doc))
}

/// Check the references in a piece of text typed into node `node_id`.
#[wasm_bindgen]
pub fn validate_node_text(
    flow_json: &str,
    node_id: &str,
    text: &str,
    config_json: &str,
) -> JsValue {
    let result = validate_node_text_inner(flow_json, node_id, text, config_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_node_text_inner(
    flow_json: &str,
    node_id: &str,
    text: &str,
    config_json: &str,
) -> ValidationResult {
    let (doc, validator) = match load(flow_json, config_json) {
        Ok(loaded) => loaded,
        Err(e) => return ValidationResult::from_parse(e),
    };
    match FlowGraph::build(&doc) {
        Ok(graph) => ValidationResult::from_errors(validator.validate_text(&graph, node_id, text)),
        Err(errors) => ValidationResult::from_errors(errors),
    }
}

/// Validate-on-save: apply `node_json` to the flow and validate the result.
#[wasm_bindgen]
pub fn validate_edit(flow_json: &str, node_json: &str, config_json: &str) -> JsValue {
    let result = validate_edit_inner(flow_json, node_json, config_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_edit_inner(flow_json: &str, node_json: &str, config_json: &str) -> ValidationResult {
    let (doc, validator) = match load(flow_json, config_json) {
        Ok(loaded) => loaded,
        Err(e) => return ValidationResult::from_parse(e),
    };
    let candidate = match crate::parse::parse_node(node_json) {
        Ok(node) => node,
        Err(e) => return ValidationResult::from_parse(e),
    };
    ValidationResult::from_errors(validator.validate_edit(&doc, &candidate))
}

/// Reference expressions node `node_id` may use, for the variable picker.
/// Returns an empty array when the flow cannot be read.
#[wasm_bindgen]
pub fn available_references(flow_json: &str, node_id: &str, config_json: &str) -> JsValue {
    let result = available_references_inner(flow_json, node_id, config_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn available_references_inner(
    flow_json: &str,
    node_id: &str,
    config_json: &str,
) -> Vec<AvailableReference> {
    let Ok((doc, validator)) = load(flow_json, config_json) else {
        return vec![];
    };
    let Ok(graph) = FlowGraph::build(&doc) else {
        return vec![];
    };
    analyze::available_references(&graph, node_id, validator.config())
}

/// Check an execute-webhook body against the flow's trigger schema.
#[wasm_bindgen]
pub fn validate_trigger_payload(flow_json: &str, body_json: &str, config_json: &str) -> JsValue {
    let result = validate_trigger_payload_inner(flow_json, body_json, config_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_trigger_payload_inner(
    flow_json: &str,
    body_json: &str,
    config_json: &str,
) -> ValidationResult {
    let (doc, validator) = match load(flow_json, config_json) {
        Ok(loaded) => loaded,
        Err(e) => return ValidationResult::from_parse(e),
    };
    let body: serde_json::Value = match serde_json::from_str(body_json) {
        Ok(body) => body,
        Err(e) => return ValidationResult::from_parse(ParseError::Document(e)),
    };
    match FlowGraph::build(&doc) {
        Ok(graph) => ValidationResult::from_errors(crate::schema::validate_payload(
            &graph,
            &body,
            validator.config(),
        )),
        Err(errors) => ValidationResult::from_errors(errors),
    }
}

fn load(flow_json: &str, config_json: &str) -> Result<(FlowDocument, Validator), ParseError> {
    let config = if config_json.trim().is_empty() {
        EngineConfig::default()
    } else {
        EngineConfig::from_json(config_json)?
    };
    let doc = crate::parse::parse(flow_json)?;
    Ok((doc, Validator::new(config)))
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    kind: String,
    code: String,
    message: String,
    field: Option<String>,
    node_id: Option<String>,
}

impl From<ValidationError> for ErrorDto {
    fn from(e: ValidationError) -> Self {
        ErrorDto {
            kind: e.kind.to_string().to_lowercase(),
            code: e.code.to_string(),
            message: e.message,
            field: e.field,
            node_id: e.node_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ValidationResult {
    Valid,
    Invalid { errors: Vec<ErrorDto> },
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid {
                errors: errors.into_iter().map(ErrorDto::from).collect(),
            }
        }
    }

    fn from_parse(e: ParseError) -> Self {
        ValidationResult::Invalid {
            errors: vec![ErrorDto {
                kind: "parse".into(),
                code: "E001".into(),
                message: e.to_string(),
                field: None,
                node_id: None,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOW: &str = r#"{
        "nodes": [
            {"id": "t1", "type": "trigger", "data": {"label": "Start", "config": {
                "schema": [{"key": "amount", "type": "number", "required": true}]
            }}},
            {"id": "a1", "type": "action", "data": {"label": "Pay", "config": {
                "service": "http", "body": "{{ steps.trigger.body.amount }}"
            }}}
        ],
        "edges": [{"source": "t1", "target": "a1"}]
    }"#;

    fn json(result: &ValidationResult) -> serde_json::Value {
        serde_json::to_value(result).unwrap()
    }

    #[test]
    fn valid_flow_reports_status() {
        let result = validate_flow_inner(FLOW, "");
        assert_eq!(json(&result), serde_json::json!({"status": "valid"}));
    }

    #[test]
    fn text_errors_are_listed() {
        let result = validate_node_text_inner(FLOW, "a1", "{{ steps.trigger.body.other }}", "{}");
        let value = json(&result);
        assert_eq!(value["status"], "invalid");
        assert_eq!(value["errors"][0]["kind"], "schema");
        assert_eq!(value["errors"][0]["code"], "R003");
        assert_eq!(value["errors"][0]["nodeId"], "a1");
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let result = validate_flow_inner("{", "");
        assert_eq!(json(&result)["errors"][0]["kind"], "parse");
    }

    #[test]
    fn payload_is_checked() {
        let result = validate_trigger_payload_inner(FLOW, r#"{"amount": "ten"}"#, "");
        assert_eq!(json(&result)["errors"][0]["code"], "P004");
    }

    #[test]
    fn references_for_picker() {
        let refs = available_references_inner(FLOW, "a1", "");
        assert_eq!(refs[1].expression, "{{ steps.trigger.body.amount }}");
    }
}
