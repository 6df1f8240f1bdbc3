//! User-editable text fields of each node kind.
//! Match arms here must track `NodeKind` in `parse/types.rs`.

use crate::parse::types::*;

/// A text field that may embed `{{ ... }}` references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField<'a> {
    /// Path inside the node, e.g. `config.headers.Authorization`.
    pub path: String,
    pub text: &'a str,
}

impl<'a> TextField<'a> {
    fn new(path: impl Into<String>, text: &'a str) -> Self {
        TextField {
            path: path.into(),
            text,
        }
    }
}

/// Every text field of `node` that is checked for references.
pub fn text_fields(node: &FlowNode) -> Vec<TextField<'_>> {
    let mut fields = Vec::new();

    match &node.kind {
        NodeKind::Trigger(_) | NodeKind::Goto(_) | NodeKind::Unknown { .. } => {}
        NodeKind::Action(c) => {
            if let Some(url) = &c.url {
                fields.push(TextField::new("config.url", url));
            }
            if let Some(method) = &c.method {
                fields.push(TextField::new("config.method", method));
            }
            for (name, value) in &c.headers {
                fields.push(TextField::new(format!("config.headers.{}", name), value));
            }
            if let Some(body) = &c.body {
                fields.push(TextField::new("config.body", body));
            }
        }
        NodeKind::Condition(c) => {
            for (i, rule) in c.rules.iter().enumerate() {
                fields.push(TextField::new(format!("config.rules[{}].left", i), &rule.left));
                fields.push(TextField::new(format!("config.rules[{}].right", i), &rule.right));
            }
        }
        NodeKind::Switch(c) => {
            fields.push(TextField::new("config.expression", &c.expression));
            for (i, case) in c.cases.iter().enumerate() {
                fields.push(TextField::new(format!("config.cases[{}].value", i), &case.value));
            }
        }
        NodeKind::Loop(c) => {
            fields.push(TextField::new("config.items", &c.items));
        }
        NodeKind::HumanTask(c) => {
            fields.push(TextField::new("config.title", &c.title));
            fields.push(TextField::new("config.description", &c.description));
            fields.push(TextField::new("config.assignee", &c.assignee));
        }
        NodeKind::Automation(c) => {
            if let Some(description) = &c.description {
                fields.push(TextField::new("config.description", description));
            }
            for (i, rule) in c.correlation.iter().enumerate() {
                fields.push(TextField::new(
                    format!("config.correlation[{}].valueExpression", i),
                    &rule.value_expression,
                ));
            }
        }
        NodeKind::Variable(c) => {
            fields.push(TextField::new("config.value", &c.value));
        }
    }

    fields
}
