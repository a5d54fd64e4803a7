use pyx_runtime_sdk::model::value::VariantPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPolicy {
    /// Log and drop events nobody handles.
    #[default]
    Ignore,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub unknown_variants: VariantPolicy,
    pub unknown_events: EventPolicy,

    /// Log every inbound and outbound frame at trace level.
    pub trace_payloads: bool,
}
