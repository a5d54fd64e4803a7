use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path::PathSegment;
use super::value::ResourceId;

pub type CallId = String;

pub mod events {
    pub const ROOT: &str = "root";
    pub const RENDER: &str = "render";
    pub const FUNCTION_RETURN: &str = "function_return";
    pub const REQUEST: &str = "request";

    pub const GET_FUNCTION_ARGUMENT: &str = "get_function_argument";
}

/// Every frame in either direction is `{event, data}`. Inbound frames are parsed
/// into this first and the payload is decoded by whichever handler owns `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,

    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionReturn {
    pub call_id: CallId,

    #[serde(rename = "return", default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerRequest {
    pub id: Value,
    pub data: Envelope,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetFunctionArgument {
    pub call_id: CallId,
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    ResourceEvent { id: ResourceId, data: ResourceEvent },
    Response { id: Value, data: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ResourceEvent {
    Call(CallPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallPayload {
    pub call_id: CallId,
    pub arg_count: usize,
    pub preloaded_data: Map<String, Value>,
}
