pub mod calls;
pub mod root;
pub mod subscriptions;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use pyx_runtime_sdk::{
    channel::OutboundChannel,
    data::ResourceStore,
    error::{PyxError, PyxResult},
    model::message::ClientMessage,
};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::convert::Converter;
use calls::CallTable;
use root::RootPointer;
use subscriptions::SubscriptionRegistry;

/// Everything a connection owns. Converted values reach back into it through weak
/// references, so it dies with the `ClientSession` that created it.
pub struct SessionState {
    pub(crate) session_id: Uuid,
    pub(crate) config: SessionConfig,
    pub(crate) span: tracing::Span,

    pub(crate) store: Box<dyn ResourceStore>,
    pub(crate) subscriptions: SubscriptionRegistry,
    pub(crate) calls: CallTable,
    pub(crate) root: RootPointer,

    channel: Arc<dyn OutboundChannel>,
    closed: AtomicBool,
}

impl SessionState {
    pub(crate) fn new(
        config: SessionConfig,
        store: Box<dyn ResourceStore>,
        channel: Arc<dyn OutboundChannel>,
    ) -> Self {
        let session_id = Uuid::new_v4();

        Self {
            session_id,
            config,
            span: tracing::info_span!("pyx_session", session_id = %session_id),
            store,
            subscriptions: SubscriptionRegistry::new(),
            calls: CallTable::new(),
            root: RootPointer::new(),
            channel,
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn converter(self: &Arc<Self>) -> Converter {
        Converter::new(Arc::downgrade(self))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> PyxResult<()> {
        if self.is_closed() {
            return Err(PyxError::SessionClosed);
        }

        Ok(())
    }

    pub(crate) fn post(&self, message: ClientMessage) -> PyxResult<()> {
        self.ensure_open()?;

        if self.config.trace_payloads {
            tracing::trace!(?message, "outbound");
        }

        self.channel.post(message)
    }

    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!(
            resources = self.store.len(),
            subscriptions = self.subscriptions.len(),
            pending_calls = self.calls.len(),
            "closing session"
        );

        self.subscriptions.clear();
        self.calls.clear();
        self.root.clear();
        self.store.clear();
    }
}
