pub mod config;
pub mod convert;
pub mod handler;
pub mod preload;
pub mod proxy;
pub mod render;
pub mod session;


use std::sync::Arc;

use config::SessionConfig;
use convert::Converter;
use handler::{
    events::{FunctionReturnHandler, RenderHandler, RequestHandler, RootHandler},
    EventDispatcher, EventHandler, HandlerType,
};
use proxy::{RemoteFunction, SubscribedView};
use pyx_runtime_sdk::{
    channel::OutboundChannel,
    data::{in_memory_store::InMemoryStore, ResourceStore},
    error::PyxResult,
    model::{
        message::{events, Envelope},
        value::{PreloadPlan, RawValue, ResourceId},
    },
};
use render::RenderValue;
use session::SessionState;
use uuid::Uuid;

pub use session::calls::PendingCall;
pub use session::subscriptions::{SubscriptionToken, UpdateCallback};

pub struct ClientSessionBuilder {
    config: SessionConfig,
    store: Option<Box<dyn ResourceStore>>,
    channel: Arc<dyn OutboundChannel>,
    dispatcher: EventDispatcher,
}

impl ClientSessionBuilder {
    pub fn new(channel: Arc<dyn OutboundChannel>) -> Self {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(events::ROOT, Arc::new(RootHandler));
        dispatcher.register_handler(events::RENDER, Arc::new(RenderHandler));
        dispatcher.register_handler(events::FUNCTION_RETURN, Arc::new(FunctionReturnHandler));
        dispatcher.register_handler(events::REQUEST, Arc::new(RequestHandler));

        Self {
            config: SessionConfig::default(),
            store: None,
            channel,
            dispatcher,
        }
    }

    pub fn with_config(&mut self, config: SessionConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn with_store(&mut self, store: Box<dyn ResourceStore>) -> &mut Self {
        self.store = Some(store);
        self
    }

    /// Adds an observer for `event`. Observers run after the built-in handling of the
    /// same event, and may also subscribe to events the session itself ignores.
    pub fn register_handler(&mut self, event: &str, handler: Arc<dyn EventHandler>) -> &mut Self {
        if handler.get_type() == HandlerType::Internal {
            panic!("Cannot register internal event handler: {}", event);
        }

        self.dispatcher.register_handler(event, handler);
        self
    }

    pub fn build(self) -> ClientSession {
        let store = self.store.unwrap_or_else(|| Box::new(InMemoryStore::new()));

        ClientSession {
            state: Arc::new(SessionState::new(self.config, store, self.channel)),
            dispatcher: self.dispatcher,
        }
    }
}

/// Client half of one connection: the resource cache, the views watching it and the
/// calls in flight. Created on connect, closed on disconnect.
pub struct ClientSession {
    state: Arc<SessionState>,
    dispatcher: EventDispatcher,
}

impl ClientSession {
    pub fn session_id(&self) -> Uuid {
        self.state.session_id
    }

    /// Entry point for every inbound text frame.
    pub fn handle_text(&self, text: &str) -> PyxResult<()> {
        let _span = self.state.span.enter();

        if self.state.config.trace_payloads {
            tracing::trace!(frame = %text, "inbound");
        }

        let envelope: Envelope = serde_json::from_str(text)?;
        self.handle_envelope(&envelope)
    }

    pub fn handle_envelope(&self, envelope: &Envelope) -> PyxResult<()> {
        self.state.ensure_open()?;
        self.dispatcher.dispatch(&self.state, envelope)
    }

    /// Watches `id`. A value already in the store is delivered before this returns.
    pub fn subscribe<F>(&self, id: &str, on_update: F) -> SubscriptionToken
    where
        F: Fn(RenderValue) + Send + Sync + 'static,
    {
        self.state.subscriptions.subscribe(
            id.to_string(),
            Arc::new(on_update),
            self.state.store.as_ref(),
            &self.state.converter(),
        )
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        self.state.subscriptions.unsubscribe(id)
    }

    /// Pushes `value` to the current watcher of `id`, if there is one.
    pub fn notify(&self, id: &str, value: &RawValue) -> bool {
        self.state.subscriptions.notify(id, value, &self.state.converter())
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.state.subscriptions.is_subscribed(id)
    }

    pub fn view(&self, id: &str) -> SubscribedView {
        SubscribedView::new(id.to_string(), Arc::downgrade(&self.state))
    }

    pub fn function(&self, id: &str, preload_plan: Option<PreloadPlan>) -> RemoteFunction {
        RemoteFunction::new(id.to_string(), preload_plan, Arc::downgrade(&self.state))
    }

    pub fn converter(&self) -> Converter {
        self.state.converter()
    }

    pub fn convert(&self, raw: &RawValue) -> RenderValue {
        self.state.converter().convert(raw)
    }

    /// Converted form of a stored resource; `None` if it was never rendered.
    pub fn convert_resource(&self, id: &str) -> Option<RenderValue> {
        self.state.store.get(id).map(|raw| self.convert(&raw))
    }

    pub fn resource(&self, id: &str) -> Option<RawValue> {
        self.state.store.get(id)
    }

    pub fn resource_count(&self) -> usize {
        self.state.store.len()
    }

    pub fn root_id(&self) -> Option<ResourceId> {
        self.state.root.get()
    }

    /// Installs the root watcher. A root that is already known is delivered at once.
    pub fn watch_root<F>(&self, on_root: F)
    where
        F: Fn(ResourceId) + Send + Sync + 'static,
    {
        self.state.root.watch(Arc::new(on_root));
    }

    pub fn pending_call(&self, call_id: &str) -> Option<PendingCall> {
        self.state.calls.get(call_id)
    }

    pub fn pending_calls(&self) -> usize {
        self.state.calls.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Drops every cached resource, subscription and pending call. Views and functions
    /// converted earlier report `SessionClosed` from then on.
    pub fn close(&self) {
        let _span = self.state.span.enter();
        self.state.close();
    }
}
