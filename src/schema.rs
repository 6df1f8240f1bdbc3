//! Field lookup against the trigger's declared payload schema.
//!
//! Only the trigger publishes a static schema. Every other node's output is
//! shaped at runtime, so references into them are never field-checked.

use serde_json::Value;

use crate::analyze::alias::trigger_for_alias;
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::parse::{FlowGraph, SchemaField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLookup<'g> {
    Found(&'g SchemaField),
    /// The trigger declares no field with this key.
    Missing,
    /// Not a trigger field reference; nothing to check.
    Unchecked,
}

impl FieldLookup<'_> {
    pub fn found(&self) -> bool {
        !matches!(self, FieldLookup::Missing)
    }
}

pub fn resolve_field<'g>(
    graph: &'g FlowGraph,
    alias: &'g str,
    field: Option<&str>,
    config: &EngineConfig,
) -> FieldLookup<'g> {
    let Some(field) = field else {
        return FieldLookup::Unchecked;
    };
    let Some(schema) = trigger_for_alias(graph, alias, config).and_then(|t| t.trigger_schema())
    else {
        return FieldLookup::Unchecked;
    };
    match schema.iter().find(|f| f.key == field) {
        Some(f) => FieldLookup::Found(f),
        None => FieldLookup::Missing,
    }
}

/// Check an execute-webhook body against the trigger schema.
pub fn validate_payload(
    graph: &FlowGraph,
    body: &Value,
    config: &EngineConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(trigger) = graph.find_trigger() else {
        errors.push(ValidationError::structural(
            "P001",
            format!(
                "Flow must have exactly 1 trigger to accept a payload, found {}",
                graph.triggers().len()
            ),
        ));
        return errors;
    };
    let schema = trigger.trigger_schema().unwrap_or_default();

    let Some(fields) = body.as_object() else {
        errors.push(
            ValidationError::schema("P002", "Payload must be a JSON object").at_node(trigger.id()),
        );
        return errors;
    };

    for declared in schema {
        match fields.get(&declared.key) {
            None | Some(Value::Null) => {
                if declared.required {
                    errors.push(
                        ValidationError::schema(
                            "P003",
                            format!("Required field '{}' is missing", declared.key),
                        )
                        .at_node(trigger.id())
                        .in_field(declared.key.as_str()),
                    );
                }
            }
            Some(value) if !declared.field_type.matches(value) => {
                errors.push(
                    ValidationError::schema(
                        "P004",
                        format!(
                            "Field '{}' must be of type {}",
                            declared.key, declared.field_type
                        ),
                    )
                    .at_node(trigger.id())
                    .in_field(declared.key.as_str()),
                );
            }
            Some(_) => {}
        }
    }

    if config.reject_undeclared_payload_keys {
        for key in fields.keys() {
            if !schema.iter().any(|f| &f.key == key) {
                errors.push(
                    ValidationError::schema(
                        "P005",
                        format!("Field '{}' is not declared in the trigger schema", key),
                    )
                    .at_node(trigger.id())
                    .in_field(key.as_str()),
                );
            }
        }
    }

    errors
}
