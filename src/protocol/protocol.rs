use std::{path::Path, sync::Arc};

use strum_macros::{Display, IntoStaticStr};
use tokio::{
    select,
    sync::{mpsc, oneshot},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    common::error::TradeEngineError,
    message::TradeMessageEnvelope,
    messenger::PeerMessenger,
    protocol::{
        process_model::ProcessModel,
        registry::{TradeTrigger, UserAction},
        task_runner::{TaskContext, TaskRunner},
    },
    trade::{ProcessState, Trade, TradeData},
    wallet::TradeWallet,
};

/// Notifications of trade progress delivered to the registered presentation
/// channel.
#[derive(Clone, Debug)]
pub enum TradeNotif {
    StateChanged(ProcessState),
    Failed {
        state: ProcessState,
        diagnostics: Vec<String>,
    },
}

#[derive(Clone)]
pub struct ProtocolAccess {
    tx: mpsc::Sender<ProtocolRequest>,
}

impl ProtocolAccess {
    pub(super) fn new(tx: mpsc::Sender<ProtocolRequest>) -> Self {
        Self { tx }
    }

    async fn user_action(&self, action: UserAction) -> Result<ProcessState, TradeEngineError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<ProcessState, TradeEngineError>>();
        let request = ProtocolRequest::UserAction { action, rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn take_offer(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::TakeOffer).await
    }

    pub async fn confirm_deposit_tx(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::DepositTxConfirmed).await
    }

    pub async fn start_fiat_payment(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::FiatPaymentStarted).await
    }

    pub async fn confirm_fiat_payment_received(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::FiatPaymentReceived).await
    }

    pub async fn complete_trade(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::CompleteTrade).await
    }

    pub async fn open_dispute(&self) -> Result<ProcessState, TradeEngineError> {
        self.user_action(UserAction::OpenDispute).await
    }

    pub async fn query_trade(&self) -> Trade {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Trade>();
        let request = ProtocolRequest::QueryTrade { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn query_state(&self) -> ProcessState {
        let (rsp_tx, rsp_rx) = oneshot::channel::<ProcessState>();
        let request = ProtocolRequest::QueryState { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn query_error_log(&self) -> Vec<String> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Vec<String>>();
        let request = ProtocolRequest::QueryErrorLog { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn query_failure_cause(&self) -> Option<String> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Option<String>>();
        let request = ProtocolRequest::QueryFailureCause { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn query_process_model(&self) -> ProcessModel {
        let (rsp_tx, rsp_rx) = oneshot::channel::<ProcessModel>();
        let request = ProtocolRequest::QueryProcessModel { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn register_notif_tx(
        &self,
        tx: mpsc::Sender<Result<TradeNotif, TradeEngineError>>,
    ) -> Result<(), TradeEngineError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<(), TradeEngineError>>();
        let request = ProtocolRequest::RegisterNotifTx { tx, rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn unregister_notif_tx(&self) -> Result<(), TradeEngineError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<(), TradeEngineError>>();
        let request = ProtocolRequest::UnregisterNotifTx { rsp_tx };
        self.tx.send(request).await.unwrap();
        rsp_rx.await.unwrap()
    }

    pub async fn shutdown(&self) -> Result<(), TradeEngineError> {
        let (rsp_tx, rsp_rx) = oneshot::channel::<Result<(), TradeEngineError>>();
        let request = ProtocolRequest::Shutdown { rsp_tx };
        self.tx.send(request).await?; // Shutdown is allowed to fail if already shutdown
        rsp_rx.await?
    }
}

/// Per-trade dispatcher - the single authority over one trade's task
/// execution. Owns the Trade record and runs one task chain at a time; a
/// trigger arriving while a chain is in flight waits in channel order until
/// the in-flight runner terminates.
pub(crate) struct TradeProtocol {
    tx: mpsc::Sender<ProtocolRequest>,
    envelope_tx: mpsc::Sender<TradeMessageEnvelope>,
    pub(crate) task_handle: tokio::task::JoinHandle<()>,
}

impl TradeProtocol {
    const PROTOCOL_REQUEST_CHANNEL_SIZE: usize = 10;
    const PROTOCOL_ENVELOPE_CHANNEL_SIZE: usize = 20;

    pub(crate) fn new(
        dir_path: impl AsRef<Path>,
        trade: Trade,
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<ProtocolRequest>(Self::PROTOCOL_REQUEST_CHANNEL_SIZE);
        let (envelope_tx, envelope_rx) =
            mpsc::channel::<TradeMessageEnvelope>(Self::PROTOCOL_ENVELOPE_CHANNEL_SIZE);
        let actor = ProtocolActor::new(rx, envelope_rx, dir_path, trade, messenger, wallet);
        let task_handle = tokio::spawn(async move { actor.run().await });
        Self {
            tx,
            envelope_tx,
            task_handle,
        }
    }

    pub(crate) fn restore(
        data_path: impl AsRef<Path>,
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
    ) -> Result<(Uuid, Self), TradeEngineError> {
        let (tx, rx) = mpsc::channel::<ProtocolRequest>(Self::PROTOCOL_REQUEST_CHANNEL_SIZE);
        let (envelope_tx, envelope_rx) =
            mpsc::channel::<TradeMessageEnvelope>(Self::PROTOCOL_ENVELOPE_CHANNEL_SIZE);
        let (trade_uuid, actor) =
            ProtocolActor::restore(rx, envelope_rx, data_path, messenger, wallet)?;
        let task_handle = tokio::spawn(async move { actor.run().await });
        let protocol = Self {
            tx,
            envelope_tx,
            task_handle,
        };
        Ok((trade_uuid, protocol))
    }

    pub(crate) fn new_accessor(&self) -> ProtocolAccess {
        ProtocolAccess::new(self.tx.clone())
    }

    pub(crate) fn envelope_tx(&self) -> mpsc::Sender<TradeMessageEnvelope> {
        self.envelope_tx.clone()
    }
}

#[derive(Display, IntoStaticStr)]
pub(super) enum ProtocolRequest {
    UserAction {
        action: UserAction,
        rsp_tx: oneshot::Sender<Result<ProcessState, TradeEngineError>>,
    },
    QueryTrade {
        rsp_tx: oneshot::Sender<Trade>,
    },
    QueryState {
        rsp_tx: oneshot::Sender<ProcessState>,
    },
    QueryErrorLog {
        rsp_tx: oneshot::Sender<Vec<String>>,
    },
    QueryFailureCause {
        rsp_tx: oneshot::Sender<Option<String>>,
    },
    QueryProcessModel {
        rsp_tx: oneshot::Sender<ProcessModel>,
    },
    RegisterNotifTx {
        tx: mpsc::Sender<Result<TradeNotif, TradeEngineError>>,
        rsp_tx: oneshot::Sender<Result<(), TradeEngineError>>,
    },
    UnregisterNotifTx {
        rsp_tx: oneshot::Sender<Result<(), TradeEngineError>>,
    },
    Shutdown {
        rsp_tx: oneshot::Sender<Result<(), TradeEngineError>>,
    },
}

struct ProtocolActor {
    rx: mpsc::Receiver<ProtocolRequest>,
    envelope_rx: mpsc::Receiver<TradeMessageEnvelope>,
    messenger: Arc<dyn PeerMessenger>,
    wallet: Arc<dyn TradeWallet>,
    data: TradeData,
    notif_tx: Option<mpsc::Sender<Result<TradeNotif, TradeEngineError>>>,
}

impl ProtocolActor {
    fn new(
        rx: mpsc::Receiver<ProtocolRequest>,
        envelope_rx: mpsc::Receiver<TradeMessageEnvelope>,
        dir_path: impl AsRef<Path>,
        trade: Trade,
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
    ) -> Self {
        let data = TradeData::new(dir_path, trade);

        ProtocolActor {
            rx,
            envelope_rx,
            messenger,
            wallet,
            data,
            notif_tx: None,
        }
    }

    fn restore(
        rx: mpsc::Receiver<ProtocolRequest>,
        envelope_rx: mpsc::Receiver<TradeMessageEnvelope>,
        data_path: impl AsRef<Path>,
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
    ) -> Result<(Uuid, Self), TradeEngineError> {
        let (trade_uuid, data) = TradeData::restore(data_path)?;

        let actor = ProtocolActor {
            rx,
            envelope_rx,
            messenger,
            wallet,
            data,
            notif_tx: None,
        };

        Ok((trade_uuid, actor))
    }

    async fn run(mut self) {
        loop {
            select! {
                Some(request) = self.rx.recv() => {
                    if self.handle_request(request).await {
                        break;
                    }
                },
                Some(envelope) = self.envelope_rx.recv() => {
                    self.handle_peer_envelope(envelope).await;
                },
                else => break,
            }
        }
        info!(
            "TradeProtocol w/ TradeUUID {} terminating",
            self.data.trade_uuid
        );
        self.data.terminate();
    }

    // Top-down Request Handling

    async fn handle_request(&mut self, request: ProtocolRequest) -> bool {
        let mut terminate = false;

        debug!(
            "TradeProtocol w/ TradeUUID {} handle_request() of type {}",
            self.data.trade_uuid, request
        );

        match request {
            ProtocolRequest::UserAction { action, rsp_tx } => {
                let result = self.execute_trigger(TradeTrigger::User(action)).await;
                rsp_tx.send(result).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::QueryTrade { rsp_tx } => {
                rsp_tx.send(self.data.trade()).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::QueryState { rsp_tx } => {
                rsp_tx.send(self.data.state()).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::QueryErrorLog { rsp_tx } => {
                rsp_tx.send(self.data.error_log()).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::QueryFailureCause { rsp_tx } => {
                rsp_tx.send(self.data.failure_cause()).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::QueryProcessModel { rsp_tx } => {
                rsp_tx.send(self.data.process_model()).unwrap(); // oneshot should not fail
            }
            ProtocolRequest::RegisterNotifTx { tx, rsp_tx } => {
                self.register_notif_tx(tx, rsp_tx);
            }
            ProtocolRequest::UnregisterNotifTx { rsp_tx } => {
                self.unregister_notif_tx(rsp_tx);
            }
            ProtocolRequest::Shutdown { rsp_tx } => {
                rsp_tx.send(Ok(())).unwrap(); // oneshot should not fail
                terminate = true;
            }
        }
        terminate
    }

    fn register_notif_tx(
        &mut self,
        tx: mpsc::Sender<Result<TradeNotif, TradeEngineError>>,
        rsp_tx: oneshot::Sender<Result<(), TradeEngineError>>,
    ) {
        let mut result = Ok(());
        if self.notif_tx.is_some() {
            let error = TradeEngineError::Simple(format!(
                "TradeProtocol w/ TradeUUID {} already have notif_tx registered",
                self.data.trade_uuid
            ));
            result = Err(error);
        }
        self.notif_tx = Some(tx);
        rsp_tx.send(result).unwrap();
    }

    fn unregister_notif_tx(&mut self, rsp_tx: oneshot::Sender<Result<(), TradeEngineError>>) {
        let mut result = Ok(());
        if self.notif_tx.is_none() {
            let error = TradeEngineError::Simple(format!(
                "TradeProtocol w/ TradeUUID {} expected to already have notif_tx registered",
                self.data.trade_uuid
            ));
            result = Err(error);
        }
        self.notif_tx = None;
        rsp_tx.send(result).unwrap();
    }

    // Bottom-up Peer Message Handling

    async fn handle_peer_envelope(&mut self, envelope: TradeMessageEnvelope) {
        debug!(
            "TradeProtocol w/ TradeUUID {} handle_peer_envelope() from peer {}, message {}",
            self.data.trade_uuid, envelope.peer, envelope.message
        );

        let expected_peer = self.data.process_model().peer();
        if envelope.peer != expected_peer {
            error!(
                "TradeProtocol w/ TradeUUID {} received {} from unexpected peer {}",
                self.data.trade_uuid, envelope.message, envelope.peer
            );
            return;
        }

        if envelope.message.trade_uuid() != self.data.trade_uuid {
            error!(
                "TradeProtocol w/ TradeUUID {} received {} destined for TradeUUID {}",
                self.data.trade_uuid,
                envelope.message,
                envelope.message.trade_uuid()
            );
            return;
        }

        // A mismatched message is dropped with state untouched
        if let Some(error) = self
            .execute_trigger(TradeTrigger::Message(envelope.message))
            .await
            .err()
        {
            warn!(
                "TradeProtocol w/ TradeUUID {} dropped peer message - {}",
                self.data.trade_uuid, error
            );
        }
    }

    // Task Chain Execution

    async fn execute_trigger(
        &mut self,
        trigger: TradeTrigger,
    ) -> Result<ProcessState, TradeEngineError> {
        let state = self.data.state();
        let role = self.data.role();

        let sequence = match role.sequence_for(state, &trigger) {
            Some(sequence) => sequence,
            None => {
                return Err(TradeEngineError::Simple(format!(
                    "No task sequence registered for {} Trade w/ TradeUUID {} in state {} on trigger {}",
                    role, self.data.trade_uuid, state, trigger
                )));
            }
        };

        let mut context = TaskContext {
            trade_uuid: self.data.trade_uuid,
            role,
            model: self.data.process_model(),
            inbound: trigger.message(),
            messenger: self.messenger.clone(),
            wallet: self.wallet.clone(),
        };

        let runner = TaskRunner::new(context.trade_uuid, context.role);
        let outcome = runner.run(sequence.tasks, &mut context).await;
        debug!(
            "TradeProtocol w/ TradeUUID {} chain for trigger {} finished - success {}, tasks started {}",
            self.data.trade_uuid,
            trigger,
            outcome.is_success(),
            outcome.started
        );

        // Model mutations made before a failure stick - the chain may have
        // already applied side effects the failure does not undo
        self.data.set_process_model(context.model);

        match outcome.failure {
            None => {
                self.transition_to(sequence.success_state);
                self.notify(TradeNotif::StateChanged(sequence.success_state))
                    .await;
                Ok(sequence.success_state)
            }
            Some(failure) => {
                if let Some(cause) = &failure.cause {
                    self.data.set_failure_cause(cause.clone());
                }
                self.data.append_error_log(failure.diagnostics.clone());
                self.transition_to(failure.state);
                self.notify(TradeNotif::Failed {
                    state: failure.state,
                    diagnostics: failure.diagnostics,
                })
                .await;
                Ok(failure.state)
            }
        }
    }

    fn transition_to(&mut self, state: ProcessState) {
        if let Some(error) = self.data.transition_to(state).err() {
            error!(
                "TradeProtocol w/ TradeUUID {} refused state transition - {}",
                self.data.trade_uuid, error
            );
        }
    }

    async fn notify(&mut self, notif: TradeNotif) {
        if let Some(tx) = &self.notif_tx {
            if let Some(error) = tx.send(Ok(notif)).await.err() {
                error!(
                    "TradeProtocol w/ TradeUUID {} failed in notifying user - {}",
                    self.data.trade_uuid, error
                );
            }
        } else {
            warn!(
                "TradeProtocol w/ TradeUUID {} do not have notif_tx registered",
                self.data.trade_uuid
            );
        }
    }
}
