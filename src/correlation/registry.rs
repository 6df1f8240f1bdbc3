//! Flow instances currently parked on automation nodes.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

use super::matcher::{match_signal, pending_rules};
use super::{InstanceRecord, Resumption, Signal};
use crate::config::EngineConfig;
use crate::error::GraphError;
use crate::parse::{FlowGraph, NodeKind};

#[derive(Debug)]
struct WaitingInstance {
    graph: Arc<FlowGraph>,
    record: InstanceRecord,
    /// Automation node ids, in the order they were parked.
    waiting: Vec<String>,
}

/// Waiting flow instances, keyed by instance id.
///
/// Matching a signal and releasing the matched node happen under the
/// instance's entry lock, so concurrent signals for one instance resume at
/// most one wait each.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    instances: DashMap<String, WaitingInstance>,
    config: EngineConfig,
}

impl CorrelationRegistry {
    pub fn new(config: EngineConfig) -> Self {
        CorrelationRegistry {
            instances: DashMap::new(),
            config,
        }
    }

    /// Park `record`'s instance on the automation node `node_id`.
    ///
    /// The first park of an instance stores its graph snapshot. Every park
    /// merges the record's step outputs into the stored ones, newer outputs
    /// replacing older ones for the same step.
    pub fn park(
        &self,
        graph: Arc<FlowGraph>,
        record: InstanceRecord,
        node_id: &str,
    ) -> Result<(), GraphError> {
        match graph.node(node_id).map(|n| &n.kind) {
            Some(NodeKind::Automation(_)) => {}
            Some(_) => {
                return Err(GraphError::NotAutomation {
                    node_id: node_id.to_string(),
                });
            }
            None => {
                return Err(GraphError::NodeNotFound {
                    node_id: node_id.to_string(),
                });
            }
        }

        let instance_id = record.instance_id.clone();
        let mut entry = self
            .instances
            .entry(instance_id.clone())
            .or_insert_with(|| WaitingInstance {
                graph,
                record: InstanceRecord::new(instance_id.clone()),
                waiting: Vec::new(),
            });
        entry.record.step_outputs.extend(record.step_outputs);
        if !entry.waiting.iter().any(|id| id == node_id) {
            entry.waiting.push(node_id.to_string());
        }
        debug!(instance_id = %instance_id, node_id, "parked flow instance");
        Ok(())
    }

    /// Record a step output for a waiting instance. Returns false when the
    /// instance is not waiting.
    pub fn record_output(&self, instance_id: &str, node_id: &str, output: Value) -> bool {
        match self.instances.get_mut(instance_id) {
            Some(mut entry) => {
                entry.record.record(node_id, output);
                true
            }
            None => false,
        }
    }

    /// Deliver a signal. Returns the released wait, or `None` when no rule
    /// of the instance's waiting nodes matches.
    pub fn deliver(&self, signal: &Signal) -> Option<Resumption> {
        let resumed = {
            let Some(mut entry) = self.instances.get_mut(&signal.instance_id) else {
                debug!(
                    instance_id = %signal.instance_id,
                    event = %signal.event,
                    "signal for an instance that is not waiting"
                );
                return None;
            };
            let instance = &mut *entry;
            let pending = pending_rules(&instance.graph, &instance.waiting);
            let matched = match_signal(
                signal,
                &pending,
                &instance.record,
                &instance.graph,
                &self.config,
            )
            .map(|node| node.id().to_string());
            let Some(node_id) = matched else {
                debug!(
                    instance_id = %signal.instance_id,
                    event = %signal.event,
                    key = %signal.key,
                    "signal matched no correlation rule"
                );
                return None;
            };
            instance.waiting.retain(|id| *id != node_id);
            node_id
        };

        self.instances
            .remove_if(&signal.instance_id, |_, instance| instance.waiting.is_empty());
        info!(
            instance_id = %signal.instance_id,
            node_id = %resumed,
            event = %signal.event,
            "resuming flow instance"
        );
        Some(Resumption {
            instance_id: signal.instance_id.clone(),
            node_id: resumed,
        })
    }

    /// Drop every wait of an instance. Returns whether it was waiting.
    pub fn cancel(&self, instance_id: &str) -> bool {
        self.instances.remove(instance_id).is_some()
    }

    /// Automation nodes the instance is waiting on, in parking order.
    pub fn waiting_nodes(&self, instance_id: &str) -> Vec<String> {
        self.instances
            .get(instance_id)
            .map(|entry| entry.waiting.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::*;
    use serde_json::json;

    fn truck_graph() -> Arc<FlowGraph> {
        let doc = FlowDocument {
            nodes: vec![
                FlowNode::new(
                    "t1",
                    "Order",
                    NodeKind::Trigger(TriggerConfig {
                        schema: vec![SchemaField::new("order_id", FieldType::String, true)],
                        description: None,
                    }),
                ),
                FlowNode::new(
                    "w1",
                    "Truck",
                    NodeKind::Automation(AutomationConfig {
                        description: None,
                        correlation: vec![CorrelationRule::new(
                            "TruckArrival",
                            "order_id",
                            "{{ steps.trigger.body.order_id }}",
                        )],
                    }),
                ),
            ],
            edges: vec![FlowEdge::new("t1", "w1")],
            viewport: None,
        };
        Arc::new(FlowGraph::build(&doc).unwrap())
    }

    fn record(instance_id: &str) -> InstanceRecord {
        InstanceRecord::new(instance_id).with_trigger_body("t1", json!({"order_id": "42"}))
    }

    #[test]
    fn park_rejects_non_automation_nodes() {
        let registry = CorrelationRegistry::default();
        let err = registry.park(truck_graph(), record("run-1"), "t1").unwrap_err();
        assert_eq!(err.code(), "G012");
        let err = registry.park(truck_graph(), record("run-1"), "zz").unwrap_err();
        assert_eq!(err.code(), "G001");
        assert!(registry.is_empty());
    }

    #[test]
    fn deliver_releases_and_forgets_instance() {
        let registry = CorrelationRegistry::default();
        registry.park(truck_graph(), record("run-1"), "w1").unwrap();
        assert_eq!(registry.waiting_nodes("run-1"), vec!["w1".to_string()]);

        let miss = Signal::new("run-1", "TruckArrival", "order_id", "41");
        assert_eq!(registry.deliver(&miss), None);
        assert_eq!(registry.len(), 1);

        let hit = Signal::new("run-1", "TruckArrival", "order_id", "42");
        assert_eq!(
            registry.deliver(&hit),
            Some(Resumption {
                instance_id: "run-1".into(),
                node_id: "w1".into(),
            })
        );
        assert!(registry.is_empty());
        assert_eq!(registry.deliver(&hit), None);
    }

    #[test]
    fn recorded_outputs_feed_matching() {
        let registry = CorrelationRegistry::default();
        let bare = InstanceRecord::new("run-2");
        registry.park(truck_graph(), bare, "w1").unwrap();
        let signal = Signal::new("run-2", "TruckArrival", "order_id", "42");
        assert_eq!(registry.deliver(&signal), None);

        assert!(registry.record_output("run-2", "t1", json!({"body": {"order_id": "42"}})));
        assert!(registry.deliver(&signal).is_some());
        assert!(!registry.record_output("run-2", "t1", json!({})));
    }

    #[test]
    fn cancel_drops_waits() {
        let registry = CorrelationRegistry::default();
        registry.park(truck_graph(), record("run-3"), "w1").unwrap();
        assert!(registry.cancel("run-3"));
        assert!(!registry.cancel("run-3"));
        assert!(registry.waiting_nodes("run-3").is_empty());
    }
}
