use secp256k1::{
    rand::rngs::OsRng, schnorr::Signature, KeyPair, Secp256k1, SecretKey, XOnlyPublicKey,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::TradeEngineError;
use crate::common::types::PaymentAccount;
use crate::message::PeerHandle;
use crate::wallet::{BackingOutput, RawTx};

/// Terms agreed between the two parties before protocol execution starts.
/// Symmetric - both parties hold the same amounts, each with its own payment
/// account, account id and counterparty handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeTerms {
    pub trade_uuid: Uuid,
    pub bitcoin_amount_sats: u64,
    pub fiat_amount_minor: u64,
    pub payment_account: PaymentAccount,
    pub account_id: String,
    pub peer: PeerHandle,
}

/// Artifacts received from the counterparty over the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CounterpartyModel {
    pub payment_account: Option<PaymentAccount>,
    pub account_id: Option<String>,
    pub signature_public_key: Option<XOnlyPublicKey>,
    pub encryption_public_key: Option<XOnlyPublicKey>,
    pub contract_signature: Option<Signature>,
    pub payout_address: Option<String>,
}

/// Mutable context shared by every task within one trade's lifetime. Pure data
/// container - collaborator services are injected through the task context, so
/// the model stays persistable as-is. Not shared across trades; only the tasks
/// of the currently active runner mutate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessModel {
    terms: TradeTerms,
    signature_secret_key: SecretKey,
    encryption_secret_key: SecretKey,
    funding_address: Option<String>,
    payout_address: Option<String>,
    contract_json: Option<String>,
    contract_signature: Option<Signature>,
    prepared_deposit_tx: Option<RawTx>,
    backing_outputs: Vec<BackingOutput>,
    deposit_tx: Option<RawTx>,
    deposit_tx_confirmed: bool,
    payout_tx: Option<RawTx>,
    counterparty: CounterpartyModel,
}

impl ProcessModel {
    pub(crate) fn new(terms: TradeTerms) -> Self {
        Self {
            terms,
            signature_secret_key: SecretKey::new(&mut OsRng),
            encryption_secret_key: SecretKey::new(&mut OsRng),
            funding_address: None,
            payout_address: None,
            contract_json: None,
            contract_signature: None,
            prepared_deposit_tx: None,
            backing_outputs: Vec::new(),
            deposit_tx: None,
            deposit_tx_confirmed: false,
            payout_tx: None,
            counterparty: CounterpartyModel::default(),
        }
    }

    // Getter methods

    pub fn trade_uuid(&self) -> Uuid {
        self.terms.trade_uuid
    }

    pub fn terms(&self) -> &TradeTerms {
        &self.terms
    }

    pub fn peer(&self) -> PeerHandle {
        self.terms.peer
    }

    pub fn payment_account(&self) -> &PaymentAccount {
        &self.terms.payment_account
    }

    pub fn account_id(&self) -> &str {
        &self.terms.account_id
    }

    pub fn signature_keypair(&self) -> KeyPair {
        KeyPair::from_secret_key(&Secp256k1::new(), &self.signature_secret_key)
    }

    pub fn signature_public_key(&self) -> XOnlyPublicKey {
        XOnlyPublicKey::from_keypair(&self.signature_keypair()).0
    }

    pub fn encryption_public_key(&self) -> XOnlyPublicKey {
        let keypair = KeyPair::from_secret_key(&Secp256k1::new(), &self.encryption_secret_key);
        XOnlyPublicKey::from_keypair(&keypair).0
    }

    pub fn funding_address(&self) -> Option<String> {
        self.funding_address.to_owned()
    }

    pub fn payout_address(&self) -> Option<String> {
        self.payout_address.to_owned()
    }

    pub fn contract_json(&self) -> Option<String> {
        self.contract_json.to_owned()
    }

    pub fn contract_signature(&self) -> Option<Signature> {
        self.contract_signature.to_owned()
    }

    pub fn prepared_deposit_tx(&self) -> Option<RawTx> {
        self.prepared_deposit_tx.to_owned()
    }

    pub fn backing_outputs(&self) -> Vec<BackingOutput> {
        self.backing_outputs.to_owned()
    }

    pub fn deposit_tx(&self) -> Option<RawTx> {
        self.deposit_tx.to_owned()
    }

    pub fn deposit_tx_confirmed(&self) -> bool {
        self.deposit_tx_confirmed
    }

    pub fn payout_tx(&self) -> Option<RawTx> {
        self.payout_tx.to_owned()
    }

    pub fn counterparty(&self) -> CounterpartyModel {
        self.counterparty.to_owned()
    }

    // Setter methods

    pub(crate) fn set_funding_address(&mut self, funding_address: String) {
        self.funding_address = Some(funding_address);
    }

    pub(crate) fn set_payout_address(&mut self, payout_address: String) {
        self.payout_address = Some(payout_address);
    }

    pub(crate) fn set_contract(&mut self, contract_json: String, contract_signature: Signature) {
        self.contract_json = Some(contract_json);
        self.contract_signature = Some(contract_signature);
    }

    /// Write-once per protocol phase - the prepared deposit transaction may be
    /// set exactly once before it is sent onward.
    pub(crate) fn set_prepared_deposit_tx(
        &mut self,
        prepared_deposit_tx: RawTx,
        backing_outputs: Vec<BackingOutput>,
    ) -> Result<(), TradeEngineError> {
        if self.prepared_deposit_tx.is_some() {
            return Err(TradeEngineError::Simple(format!(
                "Prepared Deposit Tx for Trade w/ TradeUUID {} already set",
                self.trade_uuid()
            )));
        }
        self.prepared_deposit_tx = Some(prepared_deposit_tx);
        self.backing_outputs = backing_outputs;
        Ok(())
    }

    pub(crate) fn set_deposit_tx(&mut self, deposit_tx: RawTx) {
        self.deposit_tx = Some(deposit_tx);
    }

    pub(crate) fn set_deposit_tx_confirmed(&mut self) {
        self.deposit_tx_confirmed = true;
    }

    pub(crate) fn set_payout_tx(&mut self, payout_tx: RawTx) {
        self.payout_tx = Some(payout_tx);
    }

    pub(crate) fn set_counterparty(&mut self, counterparty: CounterpartyModel) {
        self.counterparty = counterparty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SomeTestTradeParams;

    #[test]
    fn prepared_deposit_tx_is_write_once() {
        let mut model = ProcessModel::new(SomeTestTradeParams::taker_terms());

        model
            .set_prepared_deposit_tx(RawTx(b"some-prepared-tx".to_vec()), Vec::new())
            .unwrap();

        let result =
            model.set_prepared_deposit_tx(RawTx(b"another-prepared-tx".to_vec()), Vec::new());
        assert!(result.is_err());
        assert_eq!(
            model.prepared_deposit_tx().unwrap(),
            RawTx(b"some-prepared-tx".to_vec())
        );
    }

    #[test]
    fn process_model_serde_round_trip() {
        let mut model = ProcessModel::new(SomeTestTradeParams::taker_terms());
        model.set_funding_address("tb1q-some-funding-address".to_string());

        let json = serde_json::to_string(&model).unwrap();
        let restored: ProcessModel = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.trade_uuid(), model.trade_uuid());
        assert_eq!(restored.funding_address(), model.funding_address());
        assert_eq!(restored.signature_public_key(), model.signature_public_key());
    }
}
