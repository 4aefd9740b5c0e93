use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Notify};

use crate::common::error::TradeEngineError;
use crate::message::{PeerHandle, TradeMessage, TradeMessageEnvelope};
use crate::messenger::PeerMessenger;

use super::testing::TESTING_DEFAULT_CHANNEL_SIZE;

/// Controllable messenger double - records every send, pops scripted outcomes
/// in order, and can gate sends so in-flight chains stay pending until the
/// test releases them.
pub struct TestMessenger {
    state: Mutex<TestMessengerState>,
    release_notify: Notify,
}

struct TestMessengerState {
    scripted_results: VecDeque<Result<(), TradeEngineError>>,
    sent: Vec<(PeerHandle, TradeMessage)>,
    gated: bool,
}

impl TestMessenger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TestMessengerState {
                scripted_results: VecDeque::new(),
                sent: Vec::new(),
                gated: false,
            }),
            release_notify: Notify::new(),
        }
    }

    /// Queues an outcome for a future send. Sends with no scripted outcome
    /// succeed.
    pub async fn script_result(&self, result: Result<(), TradeEngineError>) {
        self.state.lock().await.scripted_results.push_back(result);
    }

    pub async fn gate_sends(&self) {
        self.state.lock().await.gated = true;
    }

    pub async fn release_sends(&self) {
        self.state.lock().await.gated = false;
        self.release_notify.notify_waiters();
    }

    pub async fn sent_messages(&self) -> Vec<(PeerHandle, TradeMessage)> {
        self.state.lock().await.sent.to_owned()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.lock().await.sent.len()
    }
}

#[async_trait]
impl PeerMessenger for TestMessenger {
    async fn send_trade_message(
        &self,
        peer: PeerHandle,
        message: TradeMessage,
    ) -> Result<(), TradeEngineError> {
        loop {
            let released = self.release_notify.notified();
            tokio::pin!(released);
            released.as_mut().enable();
            if !self.state.lock().await.gated {
                break;
            }
            released.await;
        }

        let mut state = self.state.lock().await;
        state.sent.push((peer, message));
        state.scripted_results.pop_front().unwrap_or(Ok(()))
    }
}

/// In-process transport hub for integration tests - each registered endpoint
/// gets an inbox, and a messenger bound to one endpoint delivers envelopes
/// into the counterparty's inbox.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    inboxes: Arc<Mutex<HashMap<PeerHandle, mpsc::Sender<TradeMessageEnvelope>>>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_endpoint(
        &self,
        handle: PeerHandle,
    ) -> mpsc::Receiver<TradeMessageEnvelope> {
        let (tx, rx) = mpsc::channel::<TradeMessageEnvelope>(TESTING_DEFAULT_CHANNEL_SIZE);
        self.inboxes.lock().await.insert(handle, tx);
        rx
    }

    pub fn messenger_for(&self, own_handle: PeerHandle) -> LoopbackMessenger {
        LoopbackMessenger {
            hub: self.clone(),
            own_handle,
        }
    }
}

/// Messenger bound to one loopback endpoint. Envelopes carry the sender's
/// handle so the receiver knows who they came from.
pub struct LoopbackMessenger {
    hub: LoopbackHub,
    own_handle: PeerHandle,
}

#[async_trait]
impl PeerMessenger for LoopbackMessenger {
    async fn send_trade_message(
        &self,
        peer: PeerHandle,
        message: TradeMessage,
    ) -> Result<(), TradeEngineError> {
        let tx = match self.hub.inboxes.lock().await.get(&peer) {
            Some(tx) => tx.clone(),
            None => {
                return Err(TradeEngineError::Transport(format!(
                    "No loopback endpoint for peer {}",
                    peer
                )));
            }
        };

        let envelope = TradeMessageEnvelope {
            peer: self.own_handle,
            message,
        };
        tx.send(envelope)
            .await
            .map_err(|error| TradeEngineError::Transport(error.to_string()))
    }
}
