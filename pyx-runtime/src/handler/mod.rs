pub mod events;

use std::{collections::HashMap, sync::Arc};

use pyx_runtime_sdk::{
    error::{PyxError, PyxResult},
    model::message::Envelope,
};
use serde_json::Value;

use crate::config::EventPolicy;
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerType {
    /// Built-in handlers that maintain session state. They run first.
    Internal,

    /// Handlers that only look at an event after the session has applied it.
    Observer,
}

impl HandlerType {
    pub fn priority(&self) -> u8 {
        match self {
            HandlerType::Internal => 0,
            HandlerType::Observer => 4,
        }
    }
}

pub trait EventHandler: Send + Sync {
    fn get_type(&self) -> HandlerType;

    fn handle(&self, session: &Arc<SessionState>, data: &Value) -> PyxResult<()>;
}

pub struct EventDispatcher {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    pub fn register_handler(&mut self, event: &str, handler: Arc<dyn EventHandler>) {
        let handlers = self.handlers.entry(event.to_string()).or_default();
        handlers.push(handler);
        handlers.sort_by_key(|handler| handler.get_type().priority());
    }

    pub fn dispatch(&self, session: &Arc<SessionState>, envelope: &Envelope) -> PyxResult<()> {
        match self.handlers.get(&envelope.event) {
            Some(handlers) => {
                for handler in handlers {
                    handler.handle(session, &envelope.data)?;
                }

                Ok(())
            }
            None => unhandled(session.config.unknown_events, &envelope.event),
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the configured policy to an event nobody handles.
pub(crate) fn unhandled(policy: EventPolicy, event: &str) -> PyxResult<()> {
    match policy {
        EventPolicy::Ignore => {
            tracing::warn!(event = %event, "ignoring unknown event");
            Ok(())
        }
        EventPolicy::Reject => Err(PyxError::UnknownEvent(event.to_string())),
    }
}
