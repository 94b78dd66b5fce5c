//! Scripted adapters for driving the runtime from tests
//!
//! Each adapter is paired with a harness: the test pushes inbound events (or
//! errors) through the harness and reads back everything the relay wrote.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use duplex_core::{
    ChannelId, ControlAdapter, ControlEvent, FieldAdapter, FieldEvent, FieldMessage,
    ReceiptFrame, TransportError, TransportResult,
};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration, Instant};

pub const OPERATOR: ChannelId = 1000;

const RECV_TIMEOUT: Duration = Duration::from_secs(60);

// ----------------------------------------------------------------------------
// Control Side
// ----------------------------------------------------------------------------

pub struct ScriptedControl {
    inbound: mpsc::UnboundedReceiver<TransportResult<ControlEvent>>,
    sent: mpsc::UnboundedSender<(ChannelId, String)>,
    connects: Arc<Mutex<Vec<Instant>>>,
    disconnects: Arc<Mutex<usize>>,
}

pub struct ControlHarness {
    pub inbound: mpsc::UnboundedSender<TransportResult<ControlEvent>>,
    pub sent: mpsc::UnboundedReceiver<(ChannelId, String)>,
    pub connects: Arc<Mutex<Vec<Instant>>>,
    pub disconnects: Arc<Mutex<usize>>,
}

pub fn scripted_control() -> (ScriptedControl, ControlHarness) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let connects = Arc::new(Mutex::new(Vec::new()));
    let disconnects = Arc::new(Mutex::new(0));

    (
        ScriptedControl {
            inbound: inbound_rx,
            sent: sent_tx,
            connects: connects.clone(),
            disconnects: disconnects.clone(),
        },
        ControlHarness {
            inbound: inbound_tx,
            sent: sent_rx,
            connects,
            disconnects,
        },
    )
}

#[async_trait]
impl ControlAdapter for ScriptedControl {
    async fn connect(&mut self) -> TransportResult<()> {
        self.connects.lock().unwrap().push(Instant::now());
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<ControlEvent> {
        match self.inbound.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, channel: ChannelId, text: &str) -> TransportResult<()> {
        self.sent
            .send((channel, text.to_string()))
            .map_err(|_| TransportError::closed("test harness dropped"))
    }

    async fn disconnect(&mut self) {
        *self.disconnects.lock().unwrap() += 1;
    }
}

impl ControlHarness {
    pub fn push(&self, event: ControlEvent) {
        self.inbound.send(Ok(event)).unwrap();
    }

    pub fn fail(&self, reason: &str) {
        self.inbound.send(Err(TransportError::closed(reason))).unwrap();
    }

    pub async fn next_sent(&mut self) -> (ChannelId, String) {
        timeout(RECV_TIMEOUT, self.sent.recv())
            .await
            .expect("timed out waiting for control output")
            .expect("control adapter dropped")
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }
}

// ----------------------------------------------------------------------------
// Field Side
// ----------------------------------------------------------------------------

/// What the field adapter's next `receive` call does
pub enum FieldStep {
    Event(TransportResult<FieldEvent>),
    Panic(String),
}

/// Everything the relay asked the field adapter to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutput {
    Sent { address: String, text: String },
    Receipt { id: String },
    Ack { id: String },
}

pub struct ScriptedField {
    inbound: mpsc::UnboundedReceiver<FieldStep>,
    output: mpsc::UnboundedSender<FieldOutput>,
    connects: Arc<Mutex<Vec<Instant>>>,
    send_failures: Arc<Mutex<VecDeque<String>>>,
}

pub struct FieldHarness {
    pub inbound: mpsc::UnboundedSender<FieldStep>,
    pub output: mpsc::UnboundedReceiver<FieldOutput>,
    pub connects: Arc<Mutex<Vec<Instant>>>,
    pub send_failures: Arc<Mutex<VecDeque<String>>>,
}

pub fn scripted_field() -> (ScriptedField, FieldHarness) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let connects = Arc::new(Mutex::new(Vec::new()));
    let send_failures = Arc::new(Mutex::new(VecDeque::new()));

    (
        ScriptedField {
            inbound: inbound_rx,
            output: output_tx,
            connects: connects.clone(),
            send_failures: send_failures.clone(),
        },
        FieldHarness {
            inbound: inbound_tx,
            output: output_rx,
            connects,
            send_failures,
        },
    )
}

impl ScriptedField {
    fn record(&self, output: FieldOutput) -> TransportResult<()> {
        self.output
            .send(output)
            .map_err(|_| TransportError::closed("test harness dropped"))
    }
}

#[async_trait]
impl FieldAdapter for ScriptedField {
    async fn connect(&mut self) -> TransportResult<()> {
        self.connects.lock().unwrap().push(Instant::now());
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<FieldEvent> {
        match self.inbound.recv().await {
            Some(FieldStep::Event(event)) => event,
            Some(FieldStep::Panic(reason)) => panic!("{}", reason),
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, address: &str, text: &str) -> TransportResult<()> {
        if let Some(reason) = self.send_failures.lock().unwrap().pop_front() {
            return Err(TransportError::SendFailed { reason });
        }
        self.record(FieldOutput::Sent {
            address: address.to_string(),
            text: text.to_string(),
        })
    }

    async fn deliver_receipt(&mut self, message: &FieldMessage) -> TransportResult<()> {
        self.record(FieldOutput::Receipt {
            id: message.id.clone(),
        })
    }

    async fn acknowledge(&mut self, receipt: &ReceiptFrame) -> TransportResult<()> {
        self.record(FieldOutput::Ack {
            id: receipt.id.clone(),
        })
    }

    async fn disconnect(&mut self) {}
}

impl FieldHarness {
    pub fn push_text(&self, id: &str, address: &str, text: &str) {
        self.push(FieldEvent::Message(FieldMessage::text(id, address, text)));
    }

    pub fn push(&self, event: FieldEvent) {
        self.inbound.send(FieldStep::Event(Ok(event))).unwrap();
    }

    pub fn fail(&self, reason: &str) {
        self.inbound
            .send(FieldStep::Event(Err(TransportError::closed(reason))))
            .unwrap();
    }

    /// Make the adapter panic inside its next `receive`
    pub fn panic(&self, reason: &str) {
        self.inbound.send(FieldStep::Panic(reason.to_string())).unwrap();
    }

    pub fn fail_next_send(&self, reason: &str) {
        self.send_failures
            .lock()
            .unwrap()
            .push_back(reason.to_string());
    }

    pub async fn next_output(&mut self) -> FieldOutput {
        timeout(RECV_TIMEOUT, self.output.recv())
            .await
            .expect("timed out waiting for field output")
            .expect("field adapter dropped")
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }
}
