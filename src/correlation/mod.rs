//! Resuming paused flow instances from external signals.
//!
//! An automation node parks its flow instance until a signal arrives whose
//! event, key and value satisfy one of the node's correlation rules. The
//! matcher is pure; the registry owns the set of waiting instances.

pub mod matcher;
pub mod registry;

pub use matcher::{PendingRule, canonical, match_signal, pending_rules, resolve_value_expression};
pub use registry::CorrelationRegistry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::DEFAULT_EVENT_NAME;

/// Body of `POST /api/automation/signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default = "default_event")]
    pub event: String,
    pub key: String,
    pub value: Value,
    #[serde(rename = "flow_id")]
    pub instance_id: String,
}

fn default_event() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

impl Signal {
    pub fn new(
        instance_id: impl Into<String>,
        event: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Signal {
            event: event.into(),
            key: key.into(),
            value: value.into(),
            instance_id: instance_id.into(),
        }
    }
}

/// Outputs recorded so far by one running flow instance, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub instance_id: String,
    pub step_outputs: BTreeMap<String, Value>,
}

impl InstanceRecord {
    pub fn new(instance_id: impl Into<String>) -> Self {
        InstanceRecord {
            instance_id: instance_id.into(),
            step_outputs: BTreeMap::new(),
        }
    }

    /// Record the execute-webhook body as the trigger's output.
    pub fn with_trigger_body(mut self, trigger_id: &str, body: Value) -> Self {
        self.record(trigger_id, json!({ "body": body }));
        self
    }

    pub fn record(&mut self, node_id: impl Into<String>, output: Value) {
        self.step_outputs.insert(node_id.into(), output);
    }

    pub fn output(&self, node_id: &str) -> Option<&Value> {
        self.step_outputs.get(node_id)
    }
}

/// A waiting automation node that a signal released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resumption {
    pub instance_id: String,
    pub node_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_reads_webhook_body() {
        let signal: Signal = serde_json::from_str(
            r#"{"event":"TruckArrival","key":"order_id","value":"42","flow_id":"run-7"}"#,
        )
        .unwrap();
        assert_eq!(signal, Signal::new("run-7", "TruckArrival", "order_id", "42"));
    }

    #[test]
    fn signal_event_defaults() {
        let signal: Signal =
            serde_json::from_str(r#"{"key":"k","value":1,"flow_id":"run-1"}"#).unwrap();
        assert_eq!(signal.event, "default");
        assert_eq!(signal.value, json!(1));
    }

    #[test]
    fn trigger_body_is_wrapped() {
        let record = InstanceRecord::new("run-1").with_trigger_body("t1", json!({"a": 1}));
        assert_eq!(record.output("t1"), Some(&json!({"body": {"a": 1}})));
    }
}
