//! Gateway adapters against an in-process WebSocket server

use duplex_core::{
    ControlAdapter, ControlEvent, FieldAdapter, FieldEvent, FieldMessage, MessageKind,
    ReceiptFrame, TransportError,
};
use duplex_gateway::{GatewayConfig, GatewayControlAdapter, GatewayFieldAdapter};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use url::Url;

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

struct TestGateway {
    listener: TcpListener,
    url: Url,
}

impl TestGateway {
    async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("ws://{}", addr)).unwrap();
        Self { listener, url }
    }

    fn config(&self) -> GatewayConfig {
        GatewayConfig::new(self.url.clone())
    }

    async fn accept(&self) -> Peer {
        let (stream, _) = self.listener.accept().await.unwrap();
        Peer {
            socket: accept_async(stream).await.unwrap(),
        }
    }
}

/// Server side of one adapter connection
struct Peer {
    socket: WebSocketStream<TcpStream>,
}

impl Peer {
    async fn push(&mut self, frame: Value) {
        self.socket
            .send(Message::Text(frame.to_string()))
            .await
            .unwrap();
    }

    async fn push_raw(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.to_string()))
            .await
            .unwrap();
    }

    async fn next_frame(&mut self) -> Value {
        loop {
            match self.socket.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                Message::Close(_) => panic!("adapter closed the connection"),
                _ => continue,
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Control Adapter
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_control_adapter_round_trip() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayControlAdapter::new(gateway.config().with_auth_token("secret"));

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    assert_eq!(peer.next_frame().await, json!({"type": "auth", "token": "secret"}));

    peer.push(json!({"type": "typing", "channel_id": 1000})).await;
    peer.push(json!({
        "type": "message",
        "channel_id": 1000,
        "text": "/contacts",
        "chat": "direct"
    }))
    .await;

    let event = adapter.receive().await.unwrap();
    assert_eq!(event, ControlEvent::direct(1000, "/contacts"));

    adapter.send(1000, "Contacts:\n").await.unwrap();
    assert_eq!(
        peer.next_frame().await,
        json!({"type": "send", "channel_id": 1000, "text": "Contacts:\n"})
    );

    adapter.disconnect().await;
}

#[tokio::test]
async fn test_control_adapter_reports_malformed_frames() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayControlAdapter::new(gateway.config());

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    peer.push_raw("{not json").await;

    let error = adapter.receive().await.unwrap_err();
    assert!(matches!(error, TransportError::Protocol { .. }), "{:?}", error);
}

#[tokio::test]
async fn test_control_adapter_reports_closed_socket() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayControlAdapter::new(gateway.config());

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    peer.socket.close(None).await.unwrap();

    let error = adapter.receive().await.unwrap_err();
    assert!(matches!(error, TransportError::Closed { .. }), "{:?}", error);
}

#[tokio::test]
async fn test_unconnected_adapter_refuses_io() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayControlAdapter::new(gateway.config());

    assert!(matches!(
        adapter.send(1, "hi").await,
        Err(TransportError::NotConnected)
    ));
    assert!(matches!(
        adapter.receive().await,
        Err(TransportError::NotConnected)
    ));
}

#[tokio::test]
async fn test_connect_failure_names_endpoint() {
    // Bind then drop to get a port nobody listens on.
    let gateway = TestGateway::bind().await;
    let config = gateway.config();
    drop(gateway);

    let mut adapter = GatewayFieldAdapter::new(config);
    match adapter.connect().await {
        Err(TransportError::ConnectionFailed { endpoint, .. }) => {
            assert!(endpoint.starts_with("ws://127.0.0.1:"))
        }
        other => panic!("expected connection failure, got {:?}", other),
    }
}

// ----------------------------------------------------------------------------
// Field Adapter
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_field_adapter_messages_receipts_and_acks() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayFieldAdapter::new(gateway.config());

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    peer.push(json!({"type": "message", "id": "m1", "from": "+1555", "text": "hi"}))
        .await;
    let event = adapter.receive().await.unwrap();
    let message = FieldMessage::text("m1", "+1555", "hi");
    assert_eq!(event, FieldEvent::Message(message.clone()));

    adapter.deliver_receipt(&message).await.unwrap();
    assert_eq!(
        peer.next_frame().await,
        json!({"type": "receipt", "id": "m1", "to": "+1555", "status": "read"})
    );

    peer.push(json!({"type": "receipt", "id": "s9", "from": "+1555", "receipt_type": "read"}))
        .await;
    let receipt = match adapter.receive().await.unwrap() {
        FieldEvent::Receipt(receipt) => receipt,
        other => panic!("expected receipt, got {:?}", other),
    };
    assert_eq!(
        receipt,
        ReceiptFrame {
            id: "s9".into(),
            address: "+1555".into(),
            receipt_type: Some("read".into()),
        }
    );

    adapter.acknowledge(&receipt).await.unwrap();
    assert_eq!(
        peer.next_frame().await,
        json!({
            "type": "ack",
            "id": "s9",
            "class": "receipt",
            "receipt_type": "read",
            "to": "+1555"
        })
    );

    adapter.send("+1555", "hello back").await.unwrap();
    assert_eq!(
        peer.next_frame().await,
        json!({"type": "send", "to": "+1555", "text": "hello back"})
    );
}

#[tokio::test]
async fn test_field_adapter_keeps_reading_after_unlisted_kind() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayFieldAdapter::new(gateway.config());

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    peer.push(json!({"type": "message", "id": "m1", "from": "+1555", "kind": "image"}))
        .await;
    peer.push(json!({"type": "message", "id": "m2", "from": "+1555", "text": "after"}))
        .await;

    match adapter.receive().await.unwrap() {
        FieldEvent::Message(message) => {
            assert_eq!(message.id, "m1");
            assert_eq!(message.kind, MessageKind::Other);
            adapter.deliver_receipt(&message).await.unwrap();
        }
        other => panic!("expected message, got {:?}", other),
    }
    assert_eq!(
        peer.next_frame().await,
        json!({"type": "receipt", "id": "m1", "to": "+1555", "status": "read"})
    );

    let next = adapter.receive().await.unwrap();
    assert_eq!(
        next,
        FieldEvent::Message(FieldMessage::text("m2", "+1555", "after"))
    );
}

#[tokio::test]
async fn test_control_adapter_accepts_textless_messages() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayControlAdapter::new(gateway.config());

    let (connected, mut peer) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    peer.push(json!({"type": "message", "channel_id": -42, "sender_id": 1000, "chat": "group"}))
        .await;

    let event = adapter.receive().await.unwrap();
    assert_eq!(event, ControlEvent::group(-42, 1000, ""));
}

#[tokio::test]
async fn test_field_adapter_reconnects_on_new_socket() {
    let gateway = TestGateway::bind().await;
    let mut adapter = GatewayFieldAdapter::new(gateway.config());

    let (connected, first) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();
    drop(first);

    let (connected, mut second) = tokio::join!(adapter.connect(), gateway.accept());
    connected.unwrap();

    adapter.send("+1555", "again").await.unwrap();
    assert_eq!(
        second.next_frame().await,
        json!({"type": "send", "to": "+1555", "text": "again"})
    );
}
