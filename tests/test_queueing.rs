mod common;

#[cfg(test)]
mod queueing_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::{sync::mpsc, time::sleep};

    use crusty_trade_engine::common::error::TradeEngineError;
    use crusty_trade_engine::manager::Manager;
    use crusty_trade_engine::protocol::TradeNotif;
    use crusty_trade_engine::testing::*;
    use crusty_trade_engine::trade::{ProcessState, TradeSide};

    use super::common::{logger, some_data_dir_prefix};

    // Two triggers for the same trade while the first chain is pending on a
    // network callback - the second is queued and only starts after the first
    // chain resolves
    #[tokio::test]
    async fn test_second_trigger_queues_until_first_chain_resolves() {
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

        let (notif_tx, mut notif_rx) =
            mpsc::channel::<Result<TradeNotif, TradeEngineError>>(TESTING_DEFAULT_CHANNEL_SIZE);
        access.register_notif_tx(notif_tx).await.unwrap();

        // Hold the send so the first chain stays pending on its callback
        messenger.gate_sends().await;

        let take_offer_access = access.clone();
        let take_offer_handle =
            tokio::spawn(async move { take_offer_access.take_offer().await });

        sleep(Duration::from_millis(100)).await;

        let dispute_access = access.clone();
        let dispute_handle = tokio::spawn(async move { dispute_access.open_dispute().await });

        sleep(Duration::from_millis(100)).await;

        // First chain in flight, second trigger queued behind it
        assert!(!take_offer_handle.is_finished());
        assert!(!dispute_handle.is_finished());

        messenger.release_sends().await;

        assert_eq!(
            take_offer_handle.await.unwrap().unwrap(),
            ProcessState::DepositTxPublishRequested
        );
        assert_eq!(
            dispute_handle.await.unwrap().unwrap(),
            ProcessState::DisputeOpened
        );

        // Outcomes applied in the order the chains completed
        match notif_rx.recv().await.unwrap().unwrap() {
            TradeNotif::StateChanged(state) => {
                assert_eq!(state, ProcessState::DepositTxPublishRequested)
            }
            unexpected => panic!("Unexpected notif {:?}", unexpected),
        }
        match notif_rx.recv().await.unwrap().unwrap() {
            TradeNotif::StateChanged(state) => assert_eq!(state, ProcessState::DisputeOpened),
            unexpected => panic!("Unexpected notif {:?}", unexpected),
        }

        assert_eq!(access.query_state().await, ProcessState::DisputeOpened);
        assert_eq!(messenger.sent_count().await, 1);

        manager.shutdown().await.unwrap();
    }
}
