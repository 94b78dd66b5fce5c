//! One WebSocket session with a gateway

use duplex_core::{TransportError, TransportResult};
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, trace};

use crate::GatewayConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open WebSocket carrying JSON text frames
pub struct GatewayConnection {
    socket: Socket,
    endpoint: String,
}

impl GatewayConnection {
    pub async fn open(config: &GatewayConfig) -> TransportResult<Self> {
        let endpoint = config.url.to_string();
        debug!("Connecting to gateway at {}", endpoint);

        let (socket, _response) =
            connect_async(config.url.as_str())
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                })?;

        Ok(Self { socket, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send_json<T: Serialize>(&mut self, frame: &T) -> TransportResult<()> {
        let text = serde_json::to_string(frame)
            .map_err(|e| TransportError::protocol(format!("unencodable frame: {}", e)))?;
        trace!("-> {}", text);

        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })
    }

    /// Next JSON text frame.
    ///
    /// Cancel safe: a frame is only taken off the socket when it is returned.
    pub async fn next_json<T: DeserializeOwned>(&mut self) -> TransportResult<T> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!("<- {}", text);
                    return serde_json::from_str(&text).map_err(|e| {
                        TransportError::protocol(format!("malformed frame: {}", e))
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.into_owned())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "gateway closed the connection".to_string());
                    return Err(TransportError::closed(reason));
                }
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::closed(e.to_string())),
                None => return Err(TransportError::closed("connection ended")),
            }
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!("Error closing gateway connection {}: {}", self.endpoint, e);
        }
    }
}
