use iso_currency::Currency;
use secp256k1::{schnorr::Signature, KeyPair, Message, Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::common::error::TradeEngineError;
use crate::common::types::FiatPaymentMethod;

/// The signed document stating agreed trade terms, exchanged before funds are
/// escrowed. Serialized to canonical JSON; both parties sign the SHA-256 digest
/// of that JSON with their trade signature key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeContract {
    pub trade_uuid: Uuid,
    pub bitcoin_amount_sats: u64,
    pub fiat_amount_minor: u64,
    pub currency: Currency,
    pub payment_method: FiatPaymentMethod,
    pub taker_account_id: String,
    pub taker_payout_address: String,
    pub taker_signature_public_key: XOnlyPublicKey,
    pub offerer_peer_pubkey: XOnlyPublicKey,
}

impl TradeContract {
    pub fn to_json(&self) -> Result<String, TradeEngineError> {
        let json = serde_json::to_string(self)?;
        Ok(json)
    }

    pub fn from_json(json: impl AsRef<str>) -> Result<TradeContract, TradeEngineError> {
        let contract: TradeContract = serde_json::from_str(json.as_ref())?;
        Ok(contract)
    }

    fn digest(json: &str) -> Result<Message, TradeEngineError> {
        let hash = Sha256::digest(json.as_bytes());
        let message = Message::from_slice(hash.as_slice())?;
        Ok(message)
    }

    pub fn sign_json(json: &str, keypair: &KeyPair) -> Result<Signature, TradeEngineError> {
        let secp = Secp256k1::new();
        let message = Self::digest(json)?;
        Ok(secp.sign_schnorr(&message, keypair))
    }

    pub fn verify_json(
        json: &str,
        signature: &Signature,
        pubkey: &XOnlyPublicKey,
    ) -> Result<(), TradeEngineError> {
        let secp = Secp256k1::new();
        let message = Self::digest(json)?;
        secp.verify_schnorr(signature, &message, pubkey)?;
        Ok(())
    }
}
