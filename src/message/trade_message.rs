use std::fmt;

use secp256k1::{schnorr::Signature, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::types::PaymentAccount;
use crate::wallet::{BackingOutput, RawTx};

/// Transport level handle of a trade counterparty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerHandle {
    pub pubkey: XOnlyPublicKey,
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pubkey)
    }
}

/// Payload requesting the counterparty to co-sign and publish the deposit transaction.
/// `backing_outputs` lets the receiver validate every input of the prepared deposit
/// transaction against a genuine unspent output without prior knowledge of the
/// sender's wallet contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositTxPublishRequest {
    pub trade_uuid: Uuid,
    pub payment_account: PaymentAccount,
    pub account_id: String,
    pub signature_public_key: XOnlyPublicKey,
    pub encryption_public_key: XOnlyPublicKey,
    pub contract_json: String,
    pub contract_signature: Signature,
    pub payout_address: String,
    pub prepared_deposit_tx: RawTx,
    pub backing_outputs: Vec<BackingOutput>,
}

/// Immutable protocol step payloads. Every variant is tagged with the trade UUID
/// so the transport layer can route without understanding the payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TradeMessage {
    DepositTxPublishRequest(DepositTxPublishRequest),
    DepositTxPublished {
        trade_uuid: Uuid,
        deposit_tx: RawTx,
        payout_address: String,
    },
    FiatPaymentStarted {
        trade_uuid: Uuid,
    },
    FiatPaymentReceived {
        trade_uuid: Uuid,
    },
    PayoutTxPublished {
        trade_uuid: Uuid,
        payout_tx: RawTx,
    },
}

impl TradeMessage {
    pub fn trade_uuid(&self) -> Uuid {
        match self {
            TradeMessage::DepositTxPublishRequest(request) => request.trade_uuid,
            TradeMessage::DepositTxPublished { trade_uuid, .. } => *trade_uuid,
            TradeMessage::FiatPaymentStarted { trade_uuid } => *trade_uuid,
            TradeMessage::FiatPaymentReceived { trade_uuid } => *trade_uuid,
            TradeMessage::PayoutTxPublished { trade_uuid, .. } => *trade_uuid,
        }
    }
}

impl fmt::Display for TradeMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let type_string = match self {
            TradeMessage::DepositTxPublishRequest(_) => "DepositTxPublishRequest",
            TradeMessage::DepositTxPublished { .. } => "DepositTxPublished",
            TradeMessage::FiatPaymentStarted { .. } => "FiatPaymentStarted",
            TradeMessage::FiatPaymentReceived { .. } => "FiatPaymentReceived",
            TradeMessage::PayoutTxPublished { .. } => "PayoutTxPublished",
        };
        write!(f, "{}", type_string)
    }
}

/// A trade message together with the peer it came from, as handed over by the transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TradeMessageEnvelope {
    pub peer: PeerHandle,
    pub message: TradeMessage,
}
