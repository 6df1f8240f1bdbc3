//! Reference checking for one node: parser → reachability → schema.

use std::collections::BTreeSet;

use tracing::trace;

use crate::analyze::{AliasResolution, ancestors, resolve_alias};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::parse::FlowGraph;
use crate::reference::{Classified, classify, extract_references};
use crate::schema::{FieldLookup, resolve_field};

/// What `node_id` may reference. Built once per node and reused for all of
/// its text fields.
pub struct ReferenceScope<'g> {
    graph: &'g FlowGraph,
    node_id: &'g str,
    ancestors: BTreeSet<String>,
}

impl<'g> ReferenceScope<'g> {
    pub fn new(graph: &'g FlowGraph, node_id: &'g str) -> Self {
        ReferenceScope {
            graph,
            node_id,
            ancestors: ancestors(graph, node_id),
        }
    }

    fn allows(&self, target_id: &str) -> bool {
        target_id == self.node_id || self.ancestors.contains(target_id)
    }

    /// Check every `{{ ... }}` block in `text`, appending problems to `errors`.
    pub fn check_text(
        &self,
        text: &str,
        field: Option<&str>,
        config: &EngineConfig,
        errors: &mut Vec<ValidationError>,
    ) {
        for raw in extract_references(text) {
            let reference = match classify(&raw.inner) {
                Classified::Ignored => continue,
                Classified::SyntaxError => {
                    errors.push(self.locate(
                        ValidationError::syntax(
                            "R001",
                            format!("Malformed variable reference '{}'", raw.inner.trim()),
                        ),
                        field,
                    ));
                    continue;
                }
                Classified::Reference(r) => r,
            };
            trace!(
                node_id = self.node_id,
                alias = %reference.node_alias,
                field = ?reference.field_name,
                "checking reference"
            );

            let target = match resolve_alias(self.graph, &reference.node_alias, config) {
                AliasResolution::Node(id) => id,
                AliasResolution::Ambiguous { triggers } => {
                    errors.push(self.locate(
                        ValidationError::structural(
                            "R004",
                            format!(
                                "Cannot resolve '{}': flow has {} trigger nodes",
                                reference.node_alias, triggers
                            ),
                        ),
                        field,
                    ));
                    continue;
                }
            };

            if !self.allows(target) {
                errors.push(self.locate(
                    ValidationError::topology(
                        "R002",
                        format!(
                            "Node '{}' is not upstream of '{}'",
                            reference.node_alias, self.node_id
                        ),
                    ),
                    field,
                ));
            }

            if config.check_schema {
                let lookup = resolve_field(
                    self.graph,
                    &reference.node_alias,
                    reference.field_name.as_deref(),
                    config,
                );
                if lookup == FieldLookup::Missing {
                    errors.push(self.locate(
                        ValidationError::schema(
                            "R003",
                            format!(
                                "Field '{}' is not declared in the trigger schema",
                                reference.field_name.as_deref().unwrap_or_default()
                            ),
                        ),
                        field,
                    ));
                }
            }
        }
    }

    fn locate(&self, error: ValidationError, field: Option<&str>) -> ValidationError {
        let error = error.at_node(self.node_id);
        match field {
            Some(path) => error.in_field(path),
            None => error,
        }
    }
}
