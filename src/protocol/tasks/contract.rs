use async_trait::async_trait;

use crate::contract::TradeContract;
use crate::protocol::task_runner::{Task, TaskContext, TaskFailure};

/// Builds the contract document from the agreed terms, signs its JSON
/// rendering with the trade signature key and records both on the model.
/// Allocates the payout address the contract commits to if none exists yet.
pub(crate) struct PrepareTradeContract;

#[async_trait]
impl Task for PrepareTradeContract {
    fn name(&self) -> &'static str {
        "PrepareTradeContract"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
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

        let terms = context.model.terms();
        let contract = TradeContract {
            trade_uuid: context.trade_uuid,
            bitcoin_amount_sats: terms.bitcoin_amount_sats,
            fiat_amount_minor: terms.fiat_amount_minor,
            currency: terms.payment_account.currency.clone(),
            payment_method: terms.payment_account.method.clone(),
            taker_account_id: terms.account_id.clone(),
            taker_payout_address: payout_address,
            taker_signature_public_key: context.model.signature_public_key(),
            offerer_peer_pubkey: terms.peer.pubkey,
        };

        let contract_json = contract.to_json().map_err(TaskFailure::exception)?;
        let contract_signature =
            TradeContract::sign_json(&contract_json, &context.model.signature_keypair())
                .map_err(TaskFailure::exception)?;

        context.model.set_contract(contract_json, contract_signature);
        Ok(())
    }
}
