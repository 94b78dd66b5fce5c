//! Outbound effect queues
//!
//! The router returns `Effect`s; the dispatcher sorts them onto one unbounded
//! queue per network side. Each session drains its own queue, so a side that
//! is reconnecting simply accumulates work until it is running again.

use duplex_core::{Effect, OutboundControl, OutboundField};
use tokio::sync::mpsc;
use tracing::warn;

/// Sending half of both outbound queues
#[derive(Debug, Clone)]
pub struct EffectDispatcher {
    control: mpsc::UnboundedSender<OutboundControl>,
    field: mpsc::UnboundedSender<OutboundField>,
}

/// Receiving half of both outbound queues
#[derive(Debug)]
pub struct EffectQueues {
    pub control: mpsc::UnboundedReceiver<OutboundControl>,
    pub field: mpsc::UnboundedReceiver<OutboundField>,
}

/// Create a connected dispatcher / queue pair
pub fn effect_channels() -> (EffectDispatcher, EffectQueues) {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (field_tx, field_rx) = mpsc::unbounded_channel();

    (
        EffectDispatcher {
            control: control_tx,
            field: field_tx,
        },
        EffectQueues {
            control: control_rx,
            field: field_rx,
        },
    )
}

impl EffectDispatcher {
    /// Queue effects in order; returns how many were accepted
    pub fn dispatch(&self, effects: Vec<Effect>) -> usize {
        let mut queued = 0;

        for effect in effects {
            let side = effect.side();
            let accepted = match effect {
                Effect::SendControl { channel, text } => self
                    .control
                    .send(OutboundControl { channel, text })
                    .is_ok(),
                Effect::SendField { address, text } => {
                    self.field.send(OutboundField { address, text }).is_ok()
                }
            };

            if accepted {
                queued += 1;
            } else {
                warn!("{} outbound queue closed, dropping effect", side);
            }
        }

        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_sorts_by_side_and_keeps_order() {
        let (dispatcher, mut queues) = effect_channels();

        let queued = dispatcher.dispatch(vec![
            Effect::SendControl {
                channel: 1,
                text: "first".into(),
            },
            Effect::SendField {
                address: "+1555".into(),
                text: "hello".into(),
            },
            Effect::SendControl {
                channel: 1,
                text: "second".into(),
            },
        ]);
        assert_eq!(queued, 3);

        assert_eq!(queues.control.recv().await.unwrap().text, "first");
        assert_eq!(queues.control.recv().await.unwrap().text, "second");
        assert_eq!(queues.field.recv().await.unwrap().address, "+1555");
    }

    #[test]
    fn test_dispatch_after_queue_closed() {
        let (dispatcher, queues) = effect_channels();
        drop(queues);

        let queued = dispatcher.dispatch(vec![Effect::SendField {
            address: "+1555".into(),
            text: "lost".into(),
        }]);
        assert_eq!(queued, 0);
    }
}
