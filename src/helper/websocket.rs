use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async_tls_with_config;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

type WsError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for WebSocketClient
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Channel capacity for the inbound message queue
    pub channel_capacity: usize,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            connection_timeout: Duration::from_secs(30),
        }
    }
}

/// A JSON-RPC WebSocket subscription client. Connects to a Tendermint RPC
/// websocket endpoint, issues one `subscribe` call, and forwards every
/// inbound frame through an internal channel. Reconnection is driven by the
/// caller; a closed stream surfaces as `None` from [`receive_message`].
pub struct WebSocketClient {
    server_url: String,
    subscription: String,
    receiver: Option<mpsc::Receiver<Message>>,
    ws_handle: Option<JoinHandle<()>>,
    config: WsClientConfig,
}

impl WebSocketClient {
    pub fn new(server_url: String, subscription: String) -> Self {
        Self {
            server_url,
            subscription,
            receiver: None,
            ws_handle: None,
            config: WsClientConfig::default(),
        }
    }

    pub async fn connect(&mut self) -> Result<(), WsError> {
        info!("Connecting to WebSocket server: {}", self.server_url);

        let request = self.server_url.as_str().into_client_request()?;
        let connection_attempt = connect_async_tls_with_config(request, None, false, None);
        let (ws_stream, _response) =
            timeout(self.config.connection_timeout, connection_attempt).await??;

        info!("Connected to WebSocket server");

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let subscribe = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "subscribe",
            "id": 0,
            "params": { "query": self.subscription },
        });
        ws_sender.send(Message::Text(subscribe.to_string())).await?;

        let (tx, rx) = mpsc::channel::<Message>(self.config.channel_capacity);
        let receive_task = tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(m) => {
                        if tx.send(m).await.is_err() {
                            debug!("Receiver channel closed, stopping message forwarding");
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("WebSocket read error: {e}");
                        break;
                    }
                }
            }
        });

        self.receiver = Some(rx);
        self.ws_handle = Some(receive_task);

        Ok(())
    }

    /// The next inbound frame, or `None` once the connection is gone.
    pub async fn receive_message(&mut self) -> Option<Message> {
        match &mut self.receiver {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    pub async fn close(&mut self) {
        if let Some(handle) = self.ws_handle.take() {
            handle.abort();
        }
        self.receiver = None;
        info!("WebSocket connection closed");
    }
}
