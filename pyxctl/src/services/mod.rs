pub mod connection;

use std::sync::Arc;

use async_trait::async_trait;

#[async_trait]
pub trait HostedService: Send + Sync {
    /// Starts the background service (e.g., spawn a tokio task).
    async fn start(self: &Arc<Self>) -> anyhow::Result<()>;

    /// Stops the background service and waits for it to wind down.
    async fn stop(self: &Arc<Self>) -> anyhow::Result<()>;
}
