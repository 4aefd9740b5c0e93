mod common;

#[cfg(test)]
mod trade_flow_tests {
    use std::sync::Arc;

    use crusty_trade_engine::common::error::TradeEngineError;
    use crusty_trade_engine::manager::Manager;
    use crusty_trade_engine::message::TradeMessage;
    use crusty_trade_engine::testing::*;
    use crusty_trade_engine::trade::{ProcessState, TradeRole, TradeSide};

    use super::common::trade_testers::{spawn_envelope_pump, DepositConfirmBarrier, TradeTester};
    use super::common::{logger, some_data_dir_prefix};

    // Taker-as-Buyer, valid contract and prepared deposit transaction, send
    // succeeds - one chain from Init to DepositTxPublishRequested
    #[tokio::test]
    async fn test_take_offer_requests_deposit_tx_publish() {
        logger::setup();

        let messenger = Arc::new(TestMessenger::new());
        let wallet = Arc::new(TestWallet::new());
        let manager = Manager::new_with_dir_prefix(
            messenger.clone(),
            wallet.clone(),
            SomeTestParams::engine_name_str(),
            some_data_dir_prefix(),
        )
        .await;

        let access = manager
            .take_offer(TradeSide::Buyer, SomeTestTradeParams::taker_terms())
            .await
            .unwrap();

        let state = access.take_offer().await.unwrap();
        assert_eq!(state, ProcessState::DepositTxPublishRequested);
        assert_eq!(
            access.query_state().await,
            ProcessState::DepositTxPublishRequested
        );
        assert!(access.query_error_log().await.is_empty());

        let mut sent = messenger.sent_messages().await;
        assert_eq!(sent.len(), 1);
        let (peer, message) = sent.pop().unwrap();
        assert_eq!(peer, SomeTestTradeParams::offerer_peer_handle());

        match message {
            TradeMessage::DepositTxPublishRequest(request) => {
                assert_eq!(request.trade_uuid, SomeTestTradeParams::some_uuid());
                assert_eq!(request.account_id, "taker-account-id");
                assert_eq!(
                    request.payment_account,
                    SomeTestTradeParams::taker_payment_account()
                );
                assert!(!request.contract_json.is_empty());
                assert!(!request.payout_address.is_empty());
                assert!(!request.prepared_deposit_tx.0.is_empty());
                assert_eq!(request.backing_outputs.len(), 1);
            }
            unexpected => panic!("Expected DepositTxPublishRequest, got {}", unexpected),
        }

        manager.shutdown().await.unwrap();
    }

    // Identical setup, but the messaging collaborator reports a fault - the
    // chain aborts into MessageSendingFailed with one diagnostic appended
    #[tokio::test]
    async fn test_take_offer_send_fault_fails_trade() {
        logger::setup();

        let messenger = Arc::new(TestMessenger::new());
        let wallet = Arc::new(TestWallet::new());
        let manager = Manager::new_with_dir_prefix(
            messenger.clone(),
            wallet.clone(),
            SomeTestParams::engine_name_str(),
            some_data_dir_prefix(),
        )
        .await;

        let access = manager
            .take_offer(TradeSide::Buyer, SomeTestTradeParams::taker_terms())
            .await
            .unwrap();

        messenger
            .script_result(Err(TradeEngineError::Transport(
                "peer unreachable".to_string(),
            )))
            .await;

        let state = access.take_offer().await.unwrap();
        assert_eq!(state, ProcessState::MessageSendingFailed);
        assert_eq!(
            access.query_state().await,
            ProcessState::MessageSendingFailed
        );

        let error_log = access.query_error_log().await;
        assert_eq!(error_log.len(), 1);
        assert!(!error_log[0].is_empty());
        assert!(error_log[0].contains("DepositTxPublishRequest"));

        // The send was attempted exactly once, nothing after it ran
        assert_eq!(messenger.sent_count().await, 1);

        manager.shutdown().await.unwrap();
    }

    // Deposit transaction construction fails - the cause is recorded, state
    // becomes TaskException, and no send is ever attempted
    #[tokio::test]
    async fn test_take_offer_wallet_exception_fails_trade() {
        logger::setup();

        let messenger = Arc::new(TestMessenger::new());
        let wallet = Arc::new(TestWallet::new());
        let manager = Manager::new_with_dir_prefix(
            messenger.clone(),
            wallet.clone(),
            SomeTestParams::engine_name_str(),
            some_data_dir_prefix(),
        )
        .await;

        let access = manager
            .take_offer(TradeSide::Buyer, SomeTestTradeParams::taker_terms())
            .await
            .unwrap();

        wallet.fail_build_prepared_deposit_tx().await;

        let state = access.take_offer().await.unwrap();
        assert_eq!(state, ProcessState::TaskException);

        let failure_cause = access.query_failure_cause().await.unwrap();
        assert!(failure_cause.contains("prepared deposit tx"));
        assert_eq!(messenger.sent_count().await, 0);

        manager.shutdown().await.unwrap();
    }

    async fn run_full_trade_flow(taker_side: TradeSide, offerer_side: TradeSide) {
        let hub = LoopbackHub::new();
        let taker_handle = SomeTestTradeParams::taker_peer_handle();
        let offerer_handle = SomeTestTradeParams::offerer_peer_handle();
        let taker_rx = hub.register_endpoint(taker_handle).await;
        let offerer_rx = hub.register_endpoint(offerer_handle).await;

        let taker_wallet = Arc::new(TestWallet::new());
        let offerer_wallet = Arc::new(TestWallet::new());

        let taker_manager = Arc::new(
            Manager::new_with_dir_prefix(
                Arc::new(hub.messenger_for(taker_handle)),
                taker_wallet.clone(),
                SomeTestParams::engine_name_str(),
                some_data_dir_prefix(),
            )
            .await,
        );
        let offerer_manager = Arc::new(
            Manager::new_with_dir_prefix(
                Arc::new(hub.messenger_for(offerer_handle)),
                offerer_wallet.clone(),
                SomeTestParams::engine_name_str(),
                some_data_dir_prefix(),
            )
            .await,
        );

        let _taker_pump = spawn_envelope_pump(taker_rx, taker_manager.clone());
        let _offerer_pump = spawn_envelope_pump(offerer_rx, offerer_manager.clone());

        // The offerer side must exist before the taker's publish request lands
        let offerer_access = offerer_manager
            .accept_take_offer(offerer_side, SomeTestTradeParams::offerer_terms())
            .await
            .unwrap();
        let taker_access = taker_manager
            .take_offer(taker_side, SomeTestTradeParams::taker_terms())
            .await
            .unwrap();

        // The seller vouches for the deposit confirm; the buyer pays fiat only
        // after it - the testers stand in for the shared chain watcher
        let (confirm_tx, confirm_rx) = tokio::sync::oneshot::channel::<()>();
        let (offerer_barrier, taker_barrier) = match offerer_side {
            TradeSide::Seller => (
                DepositConfirmBarrier::Notify(confirm_tx),
                DepositConfirmBarrier::Wait(confirm_rx),
            ),
            TradeSide::Buyer => (
                DepositConfirmBarrier::Wait(confirm_rx),
                DepositConfirmBarrier::Notify(confirm_tx),
            ),
        };

        let offerer_tester = TradeTester::start(
            offerer_access.clone(),
            TradeRole::Offerer,
            offerer_side,
            offerer_barrier,
        )
        .await;
        let taker_tester = TradeTester::start(
            taker_access.clone(),
            TradeRole::Taker,
            taker_side,
            taker_barrier,
        )
        .await;

        taker_tester.wait_for_completion().await.unwrap();
        offerer_tester.wait_for_completion().await.unwrap();

        assert_eq!(taker_access.query_state().await, ProcessState::Completed);
        assert_eq!(offerer_access.query_state().await, ProcessState::Completed);
        assert!(taker_access.query_error_log().await.is_empty());
        assert!(offerer_access.query_error_log().await.is_empty());

        // The offerer publishes the deposit; the seller publishes the payout
        let (seller_wallet, buyer_wallet) = match offerer_side {
            TradeSide::Seller => (offerer_wallet.clone(), taker_wallet.clone()),
            TradeSide::Buyer => (taker_wallet.clone(), offerer_wallet.clone()),
        };
        let seller_broadcasts = seller_wallet.broadcast_txs().await;
        let buyer_broadcasts = buyer_wallet.broadcast_txs().await;
        assert_eq!(seller_broadcasts.len() + buyer_broadcasts.len(), 2);
        assert!(seller_broadcasts
            .iter()
            .any(|tx| tx.0.starts_with(b"signed-payout-tx")));

        // Both sides hold the full transaction set at completion
        for access in [&taker_access, &offerer_access] {
            let model = access.query_process_model().await;
            assert!(model.deposit_tx().is_some());
            assert!(model.payout_tx().is_some());
            assert!(model.counterparty().payout_address.is_some());
        }

        taker_manager.shutdown().await.unwrap();
        offerer_manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_full_trade_flow_taker_buys() {
        logger::setup();
        run_full_trade_flow(TradeSide::Buyer, TradeSide::Seller).await;
    }

    #[tokio::test]
    async fn test_full_trade_flow_taker_sells() {
        logger::setup();
        run_full_trade_flow(TradeSide::Seller, TradeSide::Buyer).await;
    }
}
