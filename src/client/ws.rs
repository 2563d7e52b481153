use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::client::requests::Command;
use crate::client::{LedgerClient, LedgerResponse};
use crate::error::{AppResult, ClientError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket ledger client. The single connection lives behind a mutex,
/// which also enforces the one-request-in-flight discipline.
pub struct WsLedgerClient {
    inner: Mutex<Inner>,
}

struct Inner {
    stream: WsStream,
    next_id: u64,
}

impl WsLedgerClient {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {}", url, e)))?;
        debug!("connected to {}", url);
        Ok(Self {
            inner: Mutex::new(Inner { stream, next_id: 1 }),
        })
    }

    /// Close the connection; runs on every exit path, so failures are
    /// logged rather than propagated.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Err(e) = inner.stream.close(None).await {
            warn!("error closing ledger connection: {}", e);
        }
    }
}

#[async_trait]
impl LedgerClient for WsLedgerClient {
    async fn request(&self, command: Command) -> AppResult<LedgerResponse> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let mut payload = serde_json::to_value(&command)?;
        payload["id"] = Value::from(id);
        inner
            .stream
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        loop {
            match inner.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let value: Value = serde_json::from_str(&text)
                        .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
                    if value["id"].as_u64() == Some(id) {
                        return Ok(LedgerResponse::from_value(value));
                    }
                    // unsolicited stream message for another subscription
                    debug!("skipping unsolicited message");
                }
                Some(Ok(Message::Ping(payload))) => {
                    inner
                        .stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| ClientError::Transport(e.to_string()))?;
                }
                Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed.into()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ClientError::Transport(e.to_string()).into()),
            }
        }
    }
}
