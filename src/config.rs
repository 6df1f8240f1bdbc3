//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! yields the standard behaviour.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub const DEFAULT_TRIGGER_ALIAS: &str = "trigger";
pub const DEFAULT_EVENT_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Reserved alias that refers to the flow's trigger node in `steps.<alias>`.
    pub trigger_alias: String,
    /// Event name assumed for correlation rules that leave it blank.
    pub default_event_name: String,
    /// Check `steps.<trigger>.body.<field>` against the trigger schema.
    pub check_schema: bool,
    /// Reject duplicate (case-insensitive) node labels.
    pub unique_labels: bool,
    /// Treat execute-webhook payload keys missing from the schema as errors.
    pub reject_undeclared_payload_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            trigger_alias: DEFAULT_TRIGGER_ALIAS.to_string(),
            default_event_name: DEFAULT_EVENT_NAME.to_string(),
            check_schema: true,
            unique_labels: true,
            reject_undeclared_payload_keys: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(ParseError::Config)
    }

    /// The event name a rule effectively listens for.
    pub fn effective_event_name<'a>(&'a self, event_name: &'a str) -> &'a str {
        if event_name.trim().is_empty() {
            &self.default_event_name
        } else {
            event_name
        }
    }
}
