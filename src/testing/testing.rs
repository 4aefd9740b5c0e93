use std::collections::HashMap;
use std::str::FromStr;

use iso_currency::Currency;
use secp256k1::{KeyPair, Secp256k1, SecretKey, XOnlyPublicKey};
use uuid::Uuid;

use crate::common::types::{FiatPaymentMethod, PaymentAccount};
use crate::contract::TradeContract;
use crate::message::{DepositTxPublishRequest, PeerHandle};
use crate::protocol::TradeTerms;
use crate::wallet::{BackingOutput, OutputRef, RawTx};

pub const TESTING_DEFAULT_CHANNEL_SIZE: usize = 5;

pub struct SomeTestParams {}

impl SomeTestParams {
    pub fn engine_name_str() -> String {
        "some-trade-mechanics".to_string()
    }
}

pub struct SomeTestTradeParams {}

impl SomeTestTradeParams {
    pub fn some_uuid() -> Uuid {
        Uuid::from_str("20c38e4b-037b-4654-b99c-1d9f2beb755f").unwrap()
    }

    pub fn taker_secret_key() -> SecretKey {
        SecretKey::from_str("01010101010101010001020304050607ffff0000ffff00006363636363636363")
            .unwrap()
    }

    pub fn offerer_secret_key() -> SecretKey {
        SecretKey::from_str("02020202020202020001020304050607ffff0000ffff00006363636363636363")
            .unwrap()
    }

    pub fn taker_keypair() -> KeyPair {
        KeyPair::from_secret_key(&Secp256k1::new(), &Self::taker_secret_key())
    }

    pub fn taker_pubkey() -> XOnlyPublicKey {
        XOnlyPublicKey::from_keypair(&Self::taker_keypair()).0
    }

    pub fn offerer_pubkey() -> XOnlyPublicKey {
        let keypair = KeyPair::from_secret_key(&Secp256k1::new(), &Self::offerer_secret_key());
        XOnlyPublicKey::from_keypair(&keypair).0
    }

    pub fn taker_peer_handle() -> PeerHandle {
        PeerHandle {
            pubkey: Self::taker_pubkey(),
        }
    }

    pub fn offerer_peer_handle() -> PeerHandle {
        PeerHandle {
            pubkey: Self::offerer_pubkey(),
        }
    }

    pub fn bitcoin_amount_sats() -> u64 {
        40_000_000
    }

    pub fn fiat_amount_minor() -> u64 {
        1_000_000 // 10k RMB in minor units
    }

    pub fn taker_payment_account() -> PaymentAccount {
        PaymentAccount {
            currency: Currency::CNY,
            method: FiatPaymentMethod::WeChatPay,
            details: HashMap::from([(
                "account_name".to_string(),
                "some-taker-name".to_string(),
            )]),
        }
    }

    pub fn offerer_payment_account() -> PaymentAccount {
        PaymentAccount {
            currency: Currency::CNY,
            method: FiatPaymentMethod::WeChatPay,
            details: HashMap::from([(
                "account_name".to_string(),
                "some-offerer-name".to_string(),
            )]),
        }
    }

    pub fn taker_terms() -> TradeTerms {
        TradeTerms {
            trade_uuid: Self::some_uuid(),
            bitcoin_amount_sats: Self::bitcoin_amount_sats(),
            fiat_amount_minor: Self::fiat_amount_minor(),
            payment_account: Self::taker_payment_account(),
            account_id: "taker-account-id".to_string(),
            peer: Self::offerer_peer_handle(),
        }
    }

    pub fn offerer_terms() -> TradeTerms {
        TradeTerms {
            trade_uuid: Self::some_uuid(),
            bitcoin_amount_sats: Self::bitcoin_amount_sats(),
            fiat_amount_minor: Self::fiat_amount_minor(),
            payment_account: Self::offerer_payment_account(),
            account_id: "offerer-account-id".to_string(),
            peer: Self::taker_peer_handle(),
        }
    }

    pub fn some_contract() -> TradeContract {
        TradeContract {
            trade_uuid: Self::some_uuid(),
            bitcoin_amount_sats: Self::bitcoin_amount_sats(),
            fiat_amount_minor: Self::fiat_amount_minor(),
            currency: Currency::CNY,
            payment_method: FiatPaymentMethod::WeChatPay,
            taker_account_id: "taker-account-id".to_string(),
            taker_payout_address: "tb1q-taker-payout".to_string(),
            taker_signature_public_key: Self::taker_pubkey(),
            offerer_peer_pubkey: Self::offerer_pubkey(),
        }
    }

    pub fn some_backing_output() -> BackingOutput {
        BackingOutput {
            output_ref: OutputRef {
                txid: "c84b9e35cc1f60c6f12cf6f9653c0adad8e9f8e2fde5e7f2b1c4d1e3b2a19c84"
                    .to_string(),
                vout: 0,
                value_sats: Self::bitcoin_amount_sats(),
            },
            spend_proof: b"some-spend-proof".to_vec(),
        }
    }

    pub fn some_deposit_tx_publish_request() -> DepositTxPublishRequest {
        let contract_json = Self::some_contract().to_json().unwrap();
        let contract_signature =
            TradeContract::sign_json(&contract_json, &Self::taker_keypair()).unwrap();

        DepositTxPublishRequest {
            trade_uuid: Self::some_uuid(),
            payment_account: Self::taker_payment_account(),
            account_id: "taker-account-id".to_string(),
            signature_public_key: Self::taker_pubkey(),
            encryption_public_key: Self::taker_pubkey(),
            contract_json,
            contract_signature,
            payout_address: "tb1q-taker-payout".to_string(),
            prepared_deposit_tx: RawTx(b"some-prepared-deposit-tx".to_vec()),
            backing_outputs: vec![Self::some_backing_output()],
        }
    }
}
