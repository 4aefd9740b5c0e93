use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::error::TradeEngineError;
use crate::wallet::{BackingOutput, OutputRef, RawTx, TradeWallet};

/// Canned wallet double. Addresses and transactions are synthetic but stable
/// enough for assertions; failures can be scripted per operation.
pub struct TestWallet {
    state: Mutex<TestWalletState>,
}

#[derive(Default)]
struct TestWalletState {
    allocated_addresses: usize,
    broadcast_txs: Vec<RawTx>,
    fail_build_prepared_deposit_tx: bool,
    fail_broadcast: bool,
}

impl TestWallet {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TestWalletState::default()),
        }
    }

    pub async fn fail_build_prepared_deposit_tx(&self) {
        self.state.lock().await.fail_build_prepared_deposit_tx = true;
    }

    pub async fn fail_broadcast(&self) {
        self.state.lock().await.fail_broadcast = true;
    }

    pub async fn broadcast_txs(&self) -> Vec<RawTx> {
        self.state.lock().await.broadcast_txs.to_owned()
    }
}

#[async_trait]
impl TradeWallet for TestWallet {
    async fn allocate_funding_address(&self) -> Result<String, TradeEngineError> {
        let mut state = self.state.lock().await;
        state.allocated_addresses += 1;
        Ok(format!("tb1q-funding-{}", state.allocated_addresses))
    }

    async fn allocate_payout_address(&self) -> Result<String, TradeEngineError> {
        let mut state = self.state.lock().await;
        state.allocated_addresses += 1;
        Ok(format!("tb1q-payout-{}", state.allocated_addresses))
    }

    async fn build_prepared_deposit_tx(
        &self,
        funding_address: &str,
        amount_sats: u64,
    ) -> Result<(RawTx, Vec<BackingOutput>), TradeEngineError> {
        if self.state.lock().await.fail_build_prepared_deposit_tx {
            return Err(TradeEngineError::Simple(
                "TestWallet scripted to fail building prepared deposit tx".to_string(),
            ));
        }

        let prepared_deposit_tx = RawTx(
            format!("prepared-deposit-tx/{}/{}", funding_address, amount_sats).into_bytes(),
        );
        let backing_outputs = vec![BackingOutput {
            output_ref: OutputRef {
                txid: "c84b9e35cc1f60c6f12cf6f9653c0adad8e9f8e2fde5e7f2b1c4d1e3b2a19c84"
                    .to_string(),
                vout: 0,
                value_sats: amount_sats,
            },
            spend_proof: b"some-spend-proof".to_vec(),
        }];
        Ok((prepared_deposit_tx, backing_outputs))
    }

    async fn sign_deposit_tx(
        &self,
        prepared_deposit_tx: &RawTx,
        _backing_outputs: &[BackingOutput],
    ) -> Result<RawTx, TradeEngineError> {
        let mut signed_bytes = prepared_deposit_tx.0.clone();
        signed_bytes.extend_from_slice(b"+second-signature");
        Ok(RawTx(signed_bytes))
    }

    async fn build_signed_payout_tx(
        &self,
        _deposit_tx: &RawTx,
        payout_address: &str,
    ) -> Result<RawTx, TradeEngineError> {
        Ok(RawTx(format!("signed-payout-tx/{}", payout_address).into_bytes()))
    }

    async fn broadcast_tx(&self, tx: &RawTx) -> Result<(), TradeEngineError> {
        let mut state = self.state.lock().await;
        if state.fail_broadcast {
            return Err(TradeEngineError::Simple(
                "TestWallet scripted to fail broadcast".to_string(),
            ));
        }
        state.broadcast_txs.push(tx.to_owned());
        Ok(())
    }
}
