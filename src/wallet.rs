use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::error::TradeEngineError;

/// Raw Bitcoin transaction bytes, unsigned or partially signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTx(pub Vec<u8>);

/// Reference to a transaction output backing a deposit transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
}

/// An output reference plus the ownership/spend proof the counterparty uses to
/// validate the corresponding deposit transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingOutput {
    pub output_ref: OutputRef,
    pub spend_proof: Vec<u8>,
}

/// Wallet and transaction collaborator. Key derivation, multisig script
/// construction, fee estimation and broadcast all live behind this seam.
#[async_trait]
pub trait TradeWallet: Send + Sync {
    async fn allocate_funding_address(&self) -> Result<String, TradeEngineError>;

    async fn allocate_payout_address(&self) -> Result<String, TradeEngineError>;

    /// Builds the multisig deposit transaction carrying this party's signature
    /// contribution, along with the outputs backing every one of its inputs.
    async fn build_prepared_deposit_tx(
        &self,
        funding_address: &str,
        amount_sats: u64,
    ) -> Result<(RawTx, Vec<BackingOutput>), TradeEngineError>;

    /// Applies this party's signature contribution to a counterparty-prepared
    /// deposit transaction, validating its inputs against the backing outputs.
    async fn sign_deposit_tx(
        &self,
        prepared_deposit_tx: &RawTx,
        backing_outputs: &[BackingOutput],
    ) -> Result<RawTx, TradeEngineError>;

    async fn build_signed_payout_tx(
        &self,
        deposit_tx: &RawTx,
        payout_address: &str,
    ) -> Result<RawTx, TradeEngineError>;

    async fn broadcast_tx(&self, tx: &RawTx) -> Result<(), TradeEngineError>;
}
