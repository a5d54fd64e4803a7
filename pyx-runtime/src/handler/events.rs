use std::sync::Arc;

use chrono::Utc;
use pyx_runtime_sdk::{
    error::{PyxError, PyxResult},
    model::{
        message::{events, ClientMessage, FunctionReturn, GetFunctionArgument, ServerRequest},
        path::{format_path, walk},
        value::{RawValue, ResourceId},
    },
};
use serde::Deserialize;
use serde_json::Value;

use super::{unhandled, EventHandler, HandlerType};
use crate::session::SessionState;

pub struct RootHandler;
pub struct RenderHandler;
pub struct FunctionReturnHandler;
pub struct RequestHandler;

impl EventHandler for RootHandler {
    fn get_type(&self) -> HandlerType {
        HandlerType::Internal
    }

    fn handle(&self, session: &Arc<SessionState>, data: &Value) -> PyxResult<()> {
        let id = ResourceId::deserialize(data)?;

        match session.root.set(id.clone()) {
            Some(previous) if previous != id => {
                tracing::warn!(previous = %previous, root = %id, "root pointer replaced");
            }
            _ => tracing::debug!(root = %id, "root pointer set"),
        }

        Ok(())
    }
}

impl EventHandler for RenderHandler {
    fn get_type(&self) -> HandlerType {
        HandlerType::Internal
    }

    /// Stores every entry of the batch before notifying anyone, so a view that mounts
    /// a child during notification already finds the child's data. A malformed entry
    /// is skipped and reported after the rest of the batch has been applied.
    fn handle(&self, session: &Arc<SessionState>, data: &Value) -> PyxResult<()> {
        let entries = match data {
            Value::Object(entries) => entries,
            other => {
                return Err(PyxError::MalformedMessage {
                    event: events::RENDER.to_string(),
                    reason: format!("expected a mapping of resource ids, got {}", other),
                })
            }
        };

        let mut first_error = None;
        let mut updated = Vec::with_capacity(entries.len());

        for (id, raw) in entries {
            match RawValue::decode(raw.clone(), session.config.unknown_variants) {
                Ok(value) => {
                    session.store.put(id.clone(), value.clone());
                    updated.push((id, value));
                }
                Err(e) => {
                    tracing::error!(resource = %id, error = %e, "dropping malformed resource");
                    first_error.get_or_insert(e);
                }
            }
        }

        tracing::debug!(count = updated.len(), "resources stored");

        // views mounted while this batch is being delivered read it from the store
        let watermark = session.subscriptions.watermark();
        let converter = session.converter();
        for (id, value) in &updated {
            session.subscriptions.notify_before(id, value, &converter, watermark);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl EventHandler for FunctionReturnHandler {
    fn get_type(&self) -> HandlerType {
        HandlerType::Internal
    }

    fn handle(&self, session: &Arc<SessionState>, data: &Value) -> PyxResult<()> {
        let completion = FunctionReturn::deserialize(data)?;

        // the return payload is not threaded back to the caller
        match session.calls.complete(&completion.call_id) {
            Some(call) => {
                let elapsed = Utc::now() - call.issued_at;
                tracing::debug!(
                    call_id = %completion.call_id,
                    function = %call.function_id,
                    elapsed_ms = elapsed.num_milliseconds(),
                    "remote call completed"
                );
            }
            None => tracing::debug!(
                call_id = %completion.call_id,
                "completion for unknown call ignored"
            ),
        }

        Ok(())
    }
}

impl EventHandler for RequestHandler {
    fn get_type(&self) -> HandlerType {
        HandlerType::Internal
    }

    fn handle(&self, session: &Arc<SessionState>, data: &Value) -> PyxResult<()> {
        let request = ServerRequest::deserialize(data)?;

        if request.data.event != events::GET_FUNCTION_ARGUMENT {
            return unhandled(
                session.config.unknown_events,
                &format!("{}/{}", events::REQUEST, request.data.event),
            );
        }

        let fetch = GetFunctionArgument::deserialize(&request.data.data)?;

        let args = session.calls.args(&fetch.call_id).ok_or_else(|| {
            tracing::error!(call_id = %fetch.call_id, "argument requested for unknown call");
            PyxError::UnknownCall(fetch.call_id.clone())
        })?;

        let value = walk(&args, &fetch.path).map_err(|e| {
            tracing::error!(call_id = %fetch.call_id, error = %e, "argument path does not resolve");
            e
        })?;

        tracing::debug!(
            call_id = %fetch.call_id,
            path = %format_path(&fetch.path),
            "answering argument request"
        );

        session.post(ClientMessage::Response {
            id: request.id,
            data: value.clone(),
        })
    }
}
