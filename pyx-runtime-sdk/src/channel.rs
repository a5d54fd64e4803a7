use tokio::sync::mpsc::UnboundedSender;

use crate::error::{PyxError, PyxResult};
use crate::model::message::ClientMessage;

/// Outbound half of the connection. Implementations must deliver in call order.
pub trait OutboundChannel: Send + Sync {
    fn post(&self, message: ClientMessage) -> PyxResult<()>;
}

impl OutboundChannel for UnboundedSender<ClientMessage> {
    fn post(&self, message: ClientMessage) -> PyxResult<()> {
        self.send(message)
            .map_err(|e| PyxError::Channel(e.to_string()))
    }
}
