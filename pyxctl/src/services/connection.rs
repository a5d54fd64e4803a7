use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use pyx_runtime::ClientSession;
use pyx_runtime_sdk::model::message::ClientMessage;
use tokio::{net::TcpStream, sync::mpsc::UnboundedReceiver, sync::Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::HostedService;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pumps one websocket connection: outbound messages from the session go out as
/// text frames, inbound text frames are fed to the session. The session is closed
/// when the pump exits, whatever the reason.
pub struct ConnectionService {
    session: Arc<ClientSession>,
    socket: Mutex<Option<Socket>>,
    outbound: Mutex<Option<UnboundedReceiver<ClientMessage>>>,
    cancel_token: CancellationToken,
    task_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ConnectionService {
    pub async fn connect(
        url: &str,
        session: Arc<ClientSession>,
        outbound: UnboundedReceiver<ClientMessage>,
    ) -> anyhow::Result<Self> {
        let (socket, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        tracing::info!(url, session = %session.session_id(), "connected");

        Ok(Self {
            session,
            socket: Mutex::new(Some(socket)),
            outbound: Mutex::new(Some(outbound)),
            cancel_token: CancellationToken::new(),
            task_handle: Mutex::new(None),
        })
    }

    /// Resolves once the connection is gone, either stopped or dropped by the server.
    pub async fn closed(&self) {
        self.cancel_token.cancelled().await;
    }

    async fn pump(
        session: Arc<ClientSession>,
        socket: Socket,
        mut outbound: UnboundedReceiver<ClientMessage>,
        token: CancellationToken,
    ) {
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("connection cancelled");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                Some(message) = outbound.recv() => {
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to serialize outbound message: {}", e);
                            continue;
                        }
                    };

                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::error!("Failed to send frame: {}", e);
                        break;
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = session.handle_text(&text) {
                                tracing::error!("Failed to handle frame: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(reason))) => {
                            tracing::info!(?reason, "server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("Connection error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        session.close();
        token.cancel();
    }
}

#[async_trait]
impl HostedService for ConnectionService {
    async fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        let socket = self.socket.lock().await.take().context("Connection already started")?;
        let outbound = self.outbound.lock().await.take().context("Connection already started")?;

        let handle = tokio::spawn(Self::pump(
            self.session.clone(),
            socket,
            outbound,
            self.cancel_token.clone(),
        ));

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    async fn stop(self: &Arc<Self>) -> anyhow::Result<()> {
        self.cancel_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            handle.await.ok();
        }

        tracing::debug!("connection stopped");

        Ok(())
    }
}
