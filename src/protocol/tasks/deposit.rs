use async_trait::async_trait;

use crate::common::error::TradeEngineError;
use crate::contract::TradeContract;
use crate::message::{DepositTxPublishRequest, TradeMessage};
use crate::protocol::process_model::CounterpartyModel;
use crate::protocol::task_runner::{Task, TaskContext, TaskFailure};

use super::required;

/// Allocates the funding address and has the wallet build this party's half of
/// the multisig deposit transaction, plus the outputs backing every input.
pub(crate) struct PrepareDepositTx;

#[async_trait]
impl Task for PrepareDepositTx {
    fn name(&self) -> &'static str {
        "PrepareDepositTx"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let funding_address = context
            .wallet
            .allocate_funding_address()
            .await
            .map_err(TaskFailure::exception)?;
        context.model.set_funding_address(funding_address.clone());

        let amount_sats = context.model.terms().bitcoin_amount_sats;
        let (prepared_deposit_tx, backing_outputs) = context
            .wallet
            .build_prepared_deposit_tx(&funding_address, amount_sats)
            .await
            .map_err(TaskFailure::exception)?;

        context
            .model
            .set_prepared_deposit_tx(prepared_deposit_tx, backing_outputs)
            .map_err(TaskFailure::exception)?;
        Ok(())
    }
}

/// Requests the counterparty to co-sign and publish the deposit transaction.
pub(crate) struct SendDepositTxPublishRequest;

#[async_trait]
impl Task for SendDepositTxPublishRequest {
    fn name(&self) -> &'static str {
        "SendDepositTxPublishRequest"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;

        let request = DepositTxPublishRequest {
            trade_uuid,
            payment_account: context.model.payment_account().clone(),
            account_id: context.model.account_id().to_string(),
            signature_public_key: context.model.signature_public_key(),
            encryption_public_key: context.model.encryption_public_key(),
            contract_json: required(trade_uuid, "Contract JSON", context.model.contract_json())?,
            contract_signature: required(
                trade_uuid,
                "Contract Signature",
                context.model.contract_signature(),
            )?,
            payout_address: required(
                trade_uuid,
                "Payout Address",
                context.model.payout_address(),
            )?,
            prepared_deposit_tx: required(
                trade_uuid,
                "Prepared Deposit Tx",
                context.model.prepared_deposit_tx(),
            )?,
            backing_outputs: context.model.backing_outputs(),
        };

        let message = TradeMessage::DepositTxPublishRequest(request);
        if let Some(error) = context
            .messenger
            .send_trade_message(context.model.peer(), message)
            .await
            .err()
        {
            return Err(TaskFailure::message_sending(format!(
                "Sending DepositTxPublishRequest for Trade w/ TradeUUID {} failed - {}",
                trade_uuid, error
            )));
        }
        Ok(())
    }
}

/// Validates an inbound publish request - contract terms against own terms,
/// contract signature against the sender's signature key - then records the
/// counterparty artifacts and counter-signs the agreed contract.
pub(crate) struct ProcessDepositTxPublishRequest;

#[async_trait]
impl Task for ProcessDepositTxPublishRequest {
    fn name(&self) -> &'static str {
        "ProcessDepositTxPublishRequest"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = required(trade_uuid, "Inbound Trade Message", context.inbound.clone())?;

        let request = match message {
            TradeMessage::DepositTxPublishRequest(request) => request,
            unexpected => {
                return Err(TaskFailure::exception(TradeEngineError::Simple(format!(
                    "Trade w/ TradeUUID {} expected DepositTxPublishRequest, got {}",
                    trade_uuid, unexpected
                ))));
            }
        };

        let contract = match TradeContract::from_json(&request.contract_json) {
            Ok(contract) => contract,
            Err(error) => {
                return Err(TaskFailure::validation(format!(
                    "Contract JSON for Trade w/ TradeUUID {} failed to parse - {}",
                    trade_uuid, error
                )));
            }
        };

        if contract.trade_uuid != trade_uuid {
            return Err(TaskFailure::validation(format!(
                "Contract for Trade w/ TradeUUID {} carries mismatched TradeUUID {}",
                trade_uuid, contract.trade_uuid
            )));
        }

        let terms = context.model.terms();
        if contract.bitcoin_amount_sats != terms.bitcoin_amount_sats
            || contract.fiat_amount_minor != terms.fiat_amount_minor
            || contract.currency != terms.payment_account.currency
            || contract.payment_method != terms.payment_account.method
        {
            return Err(TaskFailure::validation(format!(
                "Contract for Trade w/ TradeUUID {} does not match agreed terms",
                trade_uuid
            )));
        }

        if contract.taker_signature_public_key != request.signature_public_key {
            return Err(TaskFailure::validation(format!(
                "Contract for Trade w/ TradeUUID {} commits to a different signature key than the sender's",
                trade_uuid
            )));
        }

        if let Some(error) = TradeContract::verify_json(
            &request.contract_json,
            &request.contract_signature,
            &request.signature_public_key,
        )
        .err()
        {
            return Err(TaskFailure::validation(format!(
                "Contract signature for Trade w/ TradeUUID {} failed verification - {}",
                trade_uuid, error
            )));
        }

        // Counter-sign the now agreed contract
        let own_signature =
            TradeContract::sign_json(&request.contract_json, &context.model.signature_keypair())
                .map_err(TaskFailure::exception)?;
        context
            .model
            .set_contract(request.contract_json.clone(), own_signature);

        context.model.set_counterparty(CounterpartyModel {
            payment_account: Some(request.payment_account.clone()),
            account_id: Some(request.account_id.clone()),
            signature_public_key: Some(request.signature_public_key),
            encryption_public_key: Some(request.encryption_public_key),
            contract_signature: Some(request.contract_signature),
            payout_address: Some(request.payout_address.clone()),
        });

        context
            .model
            .set_prepared_deposit_tx(request.prepared_deposit_tx, request.backing_outputs)
            .map_err(TaskFailure::exception)?;
        Ok(())
    }
}

/// Applies the second signature contribution and broadcasts. The deposit
/// transaction is never broadcastable until both contributions are present -
/// the prepared transaction carries the counterparty's, `sign_deposit_tx`
/// adds this party's.
pub(crate) struct SignAndPublishDepositTx;

#[async_trait]
impl Task for SignAndPublishDepositTx {
    fn name(&self) -> &'static str {
        "SignAndPublishDepositTx"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let prepared_deposit_tx = required(
            trade_uuid,
            "Prepared Deposit Tx",
            context.model.prepared_deposit_tx(),
        )?;
        let backing_outputs = context.model.backing_outputs();

        let deposit_tx = context
            .wallet
            .sign_deposit_tx(&prepared_deposit_tx, &backing_outputs)
            .await
            .map_err(TaskFailure::exception)?;
        context
            .wallet
            .broadcast_tx(&deposit_tx)
            .await
            .map_err(TaskFailure::exception)?;

        context.model.set_deposit_tx(deposit_tx);
        Ok(())
    }
}

/// Notifies the counterparty that the deposit transaction is on the network,
/// carrying the fully signed transaction and this party's payout address.
pub(crate) struct SendDepositTxPublished;

#[async_trait]
impl Task for SendDepositTxPublished {
    fn name(&self) -> &'static str {
        "SendDepositTxPublished"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;

        let payout_address = match context.model.payout_address() {
            Some(payout_address) => payout_address,
            None => {
                let payout_address = context
                    .wallet
                    .allocate_payout_address()
                    .await
                    .map_err(TaskFailure::exception)?;
                context.model.set_payout_address(payout_address.clone());
                payout_address
            }
        };

        let message = TradeMessage::DepositTxPublished {
            trade_uuid,
            deposit_tx: required(trade_uuid, "Deposit Tx", context.model.deposit_tx())?,
            payout_address,
        };

        if let Some(error) = context
            .messenger
            .send_trade_message(context.model.peer(), message)
            .await
            .err()
        {
            return Err(TaskFailure::message_sending(format!(
                "Sending DepositTxPublished for Trade w/ TradeUUID {} failed - {}",
                trade_uuid, error
            )));
        }
        Ok(())
    }
}

/// Records the fully signed deposit transaction and the counterparty payout
/// address from an inbound published notification.
pub(crate) struct ProcessDepositTxPublished;

#[async_trait]
impl Task for ProcessDepositTxPublished {
    fn name(&self) -> &'static str {
        "ProcessDepositTxPublished"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        let trade_uuid = context.trade_uuid;
        let message = required(trade_uuid, "Inbound Trade Message", context.inbound.clone())?;

        let (deposit_tx, payout_address) = match message {
            TradeMessage::DepositTxPublished {
                deposit_tx,
                payout_address,
                ..
            } => (deposit_tx, payout_address),
            unexpected => {
                return Err(TaskFailure::exception(TradeEngineError::Simple(format!(
                    "Trade w/ TradeUUID {} expected DepositTxPublished, got {}",
                    trade_uuid, unexpected
                ))));
            }
        };

        context.model.set_deposit_tx(deposit_tx);

        let mut counterparty = context.model.counterparty();
        counterparty.payout_address = Some(payout_address);
        context.model.set_counterparty(counterparty);
        Ok(())
    }
}

/// Records that the deposit transaction reached confirmation depth. The chain
/// watcher itself lives above the engine.
pub(crate) struct RecordDepositTxConfirmation;

#[async_trait]
impl Task for RecordDepositTxConfirmation {
    fn name(&self) -> &'static str {
        "RecordDepositTxConfirmation"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        required(
            context.trade_uuid,
            "Deposit Tx",
            context.model.deposit_tx(),
        )?;
        context.model.set_deposit_tx_confirmed();
        Ok(())
    }
}
