mod common;

#[cfg(test)]
mod restore_tests {
    use std::sync::Arc;

    use crusty_trade_engine::manager::Manager;
    use crusty_trade_engine::testing::*;
    use crusty_trade_engine::trade::{ProcessState, TradeRole, TradeSide};

    use super::common::{logger, some_data_dir_prefix};

    #[tokio::test]
    async fn test_restore_taker_buy_trade() -> anyhow::Result<()> {
        logger::setup();

        let dir_prefix = some_data_dir_prefix();
        let trade_uuid = SomeTestTradeParams::some_uuid();

        // Take an offer, advance one step, then shut everything down
        {
            let messenger = Arc::new(TestMessenger::new());
            let wallet = Arc::new(TestWallet::new());
            let manager = Manager::new_with_dir_prefix(
                messenger,
                wallet,
                SomeTestParams::engine_name_str(),
                &dir_prefix,
            )
            .await;

            let access = manager
                .take_offer(TradeSide::Buyer, SomeTestTradeParams::taker_terms())
                .await?;
            let state = access.take_offer().await?;
            assert_eq!(state, ProcessState::DepositTxPublishRequested);

            manager.shutdown().await?;
        }

        // A fresh manager over the same data dir brings the trade back
        {
            let messenger = Arc::new(TestMessenger::new());
            let wallet = Arc::new(TestWallet::new());
            let manager = Manager::new_with_dir_prefix(
                messenger,
                wallet,
                SomeTestParams::engine_name_str(),
                &dir_prefix,
            )
            .await;

            let restored_uuids = manager.restore().await?;
            assert_eq!(restored_uuids, vec![trade_uuid]);

            let protocols = manager.get_protocols().await;
            let access = protocols.get(&trade_uuid).unwrap();

            assert_eq!(
                access.query_state().await,
                ProcessState::DepositTxPublishRequested
            );

            let trade = access.query_trade().await;
            assert_eq!(trade.trade_uuid, trade_uuid);
            assert_eq!(trade.role.role, TradeRole::Taker);
            assert_eq!(trade.role.side, TradeSide::Buyer);
            assert!(trade.error_log.is_empty());

            let model = access.query_process_model().await;
            assert!(model.contract_json().is_some());
            assert!(model.contract_signature().is_some());
            assert!(model.prepared_deposit_tx().is_some());
            assert_eq!(model.peer(), SomeTestTradeParams::offerer_peer_handle());

            manager.shutdown().await?;
        }

        Ok(())
    }
}
