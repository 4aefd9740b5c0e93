use async_trait::async_trait;

use crate::common::error::TradeEngineError;
use crate::message::TradeMessage;
use crate::protocol::task_runner::{Task, TaskContext, TaskFailure};

use super::required;

/// Seller builds the payout transaction spending the deposit to the buyer's
/// payout address, signs it and broadcasts it.
pub(crate) struct SignAndPublishPayoutTx;

#[async_trait]
impl Task for SignAndPublishPayoutTx {
    fn name(&self) -> &'static str {
        "SignAndPublishPayoutTx"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let deposit_tx = required(trade_uuid, "Deposit Tx", context.model.deposit_tx())?;
        let payout_address = required(
            trade_uuid,
            "Counterparty Payout Address",
            context.model.counterparty().payout_address,
        )?;

        let payout_tx = context
            .wallet
            .build_signed_payout_tx(&deposit_tx, &payout_address)
            .await
            .map_err(TaskFailure::exception)?;
        context
            .wallet
            .broadcast_tx(&payout_tx)
            .await
            .map_err(TaskFailure::exception)?;

        context.model.set_payout_tx(payout_tx);
        Ok(())
    }
}

/// Seller notifies the buyer that the payout transaction is on the network.
pub(crate) struct SendPayoutTxPublished;

#[async_trait]
impl Task for SendPayoutTxPublished {
    fn name(&self) -> &'static str {
        "SendPayoutTxPublished"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = TradeMessage::PayoutTxPublished {
            trade_uuid,
            payout_tx: required(trade_uuid, "Payout Tx", context.model.payout_tx())?,
        };

        if let Some(error) = context
            .messenger
            .send_trade_message(context.model.peer(), message)
            .await
            .err()
        {
            return Err(TaskFailure::message_sending(format!(
                "Sending PayoutTxPublished for Trade w/ TradeUUID {} failed - {}",
                trade_uuid, error
            )));
        }
        Ok(())
    }
}

/// Buyer records the published payout transaction.
pub(crate) struct ProcessPayoutTxPublished;

#[async_trait]
impl Task for ProcessPayoutTxPublished {
    fn name(&self) -> &'static str {
        "ProcessPayoutTxPublished"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = required(trade_uuid, "Inbound Trade Message", context.inbound.clone())?;

        match message {
            TradeMessage::PayoutTxPublished { payout_tx, .. } => {
                context.model.set_payout_tx(payout_tx);
                Ok(())
            }
            unexpected => Err(TaskFailure::exception(TradeEngineError::Simple(format!(
                "Trade w/ TradeUUID {} expected PayoutTxPublished, got {}",
                trade_uuid, unexpected
            )))),
        }
    }
}
