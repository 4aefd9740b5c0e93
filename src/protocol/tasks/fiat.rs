use async_trait::async_trait;

use crate::common::error::TradeEngineError;
use crate::message::TradeMessage;
use crate::protocol::task_runner::{Task, TaskContext, TaskFailure};

use super::required;

/// Buyer notifies the seller that the fiat leg payment has been started.
pub(crate) struct SendFiatPaymentStarted;

#[async_trait]
impl Task for SendFiatPaymentStarted {
    fn name(&self) -> &'static str {
        "SendFiatPaymentStarted"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = TradeMessage::FiatPaymentStarted { trade_uuid };

        if let Some(error) = context
            .messenger
            .send_trade_message(context.model.peer(), message)
            .await
            .err()
        {
            return Err(TaskFailure::message_sending(format!(
                "Sending FiatPaymentStarted for Trade w/ TradeUUID {} failed - {}",
                trade_uuid, error
            )));
        }
        Ok(())
    }
}

/// Seller records the buyer's fiat-payment-started notification.
pub(crate) struct ProcessFiatPaymentStarted;

#[async_trait]
impl Task for ProcessFiatPaymentStarted {
    fn name(&self) -> &'static str {
        "ProcessFiatPaymentStarted"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = required(trade_uuid, "Inbound Trade Message", context.inbound.clone())?;

        match message {
            TradeMessage::FiatPaymentStarted { .. } => Ok(()),
            unexpected => Err(TaskFailure::exception(TradeEngineError::Simple(format!(
                "Trade w/ TradeUUID {} expected FiatPaymentStarted, got {}",
                trade_uuid, unexpected
            )))),
        }
    }
}

/// Seller confirms receipt of the fiat payment to the buyer.
pub(crate) struct SendFiatPaymentReceived;

#[async_trait]
impl Task for SendFiatPaymentReceived {
    fn name(&self) -> &'static str {
        "SendFiatPaymentReceived"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = TradeMessage::FiatPaymentReceived { trade_uuid };

        if let Some(error) = context
            .messenger
            .send_trade_message(context.model.peer(), message)
            .await
            .err()
        {
            return Err(TaskFailure::message_sending(format!(
                "Sending FiatPaymentReceived for Trade w/ TradeUUID {} failed - {}",
                trade_uuid, error
            )));
        }
        Ok(())
    }
}

/// Buyer records the seller's fiat receipt confirmation.
pub(crate) struct ProcessFiatPaymentReceived;

#[async_trait]
impl Task for ProcessFiatPaymentReceived {
    fn name(&self) -> &'static str {
        "ProcessFiatPaymentReceived"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = required(trade_uuid, "Inbound Trade Message", context.inbound.clone())?;

        match message {
            TradeMessage::FiatPaymentReceived { .. } => Ok(()),
            unexpected => Err(TaskFailure::exception(TradeEngineError::Simple(format!(
                "Trade w/ TradeUUID {} expected FiatPaymentReceived, got {}",
                trade_uuid, unexpected
            )))),
        }
    }
}
