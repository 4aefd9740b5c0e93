use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crusty_trade_engine::{
    common::error::TradeEngineError,
    manager::Manager,
    message::TradeMessageEnvelope,
    protocol::{ProtocolAccess, TradeNotif},
    testing::TESTING_DEFAULT_CHANNEL_SIZE,
    trade::{ProcessState, TradeRole, TradeSide},
};

/// Pumps envelopes from a loopback inbox into a manager's transport entry point.
pub fn spawn_envelope_pump(
    mut rx: mpsc::Receiver<TradeMessageEnvelope>,
    manager: Arc<Manager>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            manager.deliver_peer_message(envelope).await;
        }
    })
}

/// Both parties observe the deposit confirming on the same chain. The tester
/// pair stands in for that chain watcher - the seller signals its confirm, the
/// buyer waits for it before starting the fiat leg.
pub enum DepositConfirmBarrier {
    Notify(oneshot::Sender<()>),
    Wait(oneshot::Receiver<()>),
}

/// Drives one party of a trade through the full happy path for its role
/// variant, sequencing user actions off the protocol's notifications.
pub struct TradeTester {
    cmpl_rx: oneshot::Receiver<Result<(), TradeEngineError>>,
}

impl TradeTester {
    pub async fn start(
        access: ProtocolAccess,
        role: TradeRole,
        side: TradeSide,
        deposit_barrier: DepositConfirmBarrier,
    ) -> Self {
        let (cmpl_tx, cmpl_rx) = oneshot::channel::<Result<(), TradeEngineError>>();
        let (notif_tx, notif_rx) =
            mpsc::channel::<Result<TradeNotif, TradeEngineError>>(TESTING_DEFAULT_CHANNEL_SIZE);

        // Register before any chain can complete so no notification is lost
        access.register_notif_tx(notif_tx).await.unwrap();

        let actor = TradeTesterActor {
            cmpl_tx,
            access,
            role,
            side,
            notif_rx,
            deposit_barrier: Some(deposit_barrier),
        };
        tokio::spawn(async move { actor.run().await });
        Self { cmpl_rx }
    }

    pub async fn wait_for_completion(self) -> Result<(), TradeEngineError> {
        self.cmpl_rx.await.unwrap()
    }
}

struct TradeTesterActor {
    cmpl_tx: oneshot::Sender<Result<(), TradeEngineError>>,
    access: ProtocolAccess,
    role: TradeRole,
    side: TradeSide,
    notif_rx: mpsc::Receiver<Result<TradeNotif, TradeEngineError>>,
    deposit_barrier: Option<DepositConfirmBarrier>,
}

impl TradeTesterActor {
    async fn run(mut self) {
        // The Taker kicks the whole thing off; the Offerer's first chain is
        // triggered by the inbound publish request
        if self.role == TradeRole::Taker {
            let state = self.access.take_offer().await.unwrap();
            assert_eq!(state, ProcessState::DepositTxPublishRequested);
        }

        self.wait_for_state(ProcessState::DepositTxPublished).await;

        // Both parties observe the deposit confirming on-chain
        let state = self.access.confirm_deposit_tx().await.unwrap();
        assert_eq!(state, ProcessState::DepositTxConfirmed);

        match self.deposit_barrier.take().unwrap() {
            DepositConfirmBarrier::Notify(tx) => {
                let _ = tx.send(());
            }
            DepositConfirmBarrier::Wait(rx) => {
                rx.await.unwrap();
            }
        }

        match self.side {
            TradeSide::Buyer => {
                let state = self.access.start_fiat_payment().await.unwrap();
                assert_eq!(state, ProcessState::FiatPaymentStarted);

                self.wait_for_state(ProcessState::FiatPaymentReceiptConfirmed)
                    .await;
                self.wait_for_state(ProcessState::PayoutTxPublished).await;
            }
            TradeSide::Seller => {
                self.wait_for_state(ProcessState::FiatPaymentStarted).await;

                let state = self.access.confirm_fiat_payment_received().await.unwrap();
                assert_eq!(state, ProcessState::PayoutTxPublished);
            }
        }

        let state = self.access.complete_trade().await.unwrap();
        assert_eq!(state, ProcessState::Completed);

        self.cmpl_tx.send(Ok(())).unwrap();
    }

    async fn wait_for_state(&mut self, target_state: ProcessState) {
        loop {
            let notif_result = self.notif_rx.recv().await.unwrap();
            match notif_result.unwrap() {
                TradeNotif::StateChanged(state) if state == target_state => return,
                TradeNotif::StateChanged(_) => continue,
                TradeNotif::Failed { state, diagnostics } => {
                    panic!(
                        "{}-as-{} trade failed in state {} - {:?}",
                        self.role, self.side, state, diagnostics
                    );
                }
            }
        }
    }
}
