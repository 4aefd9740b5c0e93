use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::{mpsc, RwLock};
use tracing::{error, warn};
use uuid::Uuid;

use crate::common::error::TradeEngineError;
use crate::message::TradeMessageEnvelope;
use crate::messenger::PeerMessenger;
use crate::protocol::{ProcessModel, ProtocolAccess, TradeTerms};
use crate::trade::{RoleVariant, Trade, TradeRole, TradeSide};
use crate::wallet::TradeWallet;

use crate::protocol::TradeProtocol;

/// Top-level owner of all trade protocols of one trade engine instance. Each
/// Trade/ProcessModel/TaskRunner triple is an isolated unit - trades execute
/// fully independently of each other.
pub struct Manager {
    messenger: Arc<dyn PeerMessenger>,
    wallet: Arc<dyn TradeWallet>,
    data_dir_path: PathBuf,
    protocols: RwLock<HashMap<Uuid, TradeProtocol>>,
    fallback_tx: RwLock<Option<mpsc::Sender<TradeMessageEnvelope>>>,
}

impl Manager {
    // Constructors

    pub async fn new(
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
        trade_engine_name: impl AsRef<str>,
    ) -> Manager {
        Self::new_with_dir_prefix(messenger, wallet, trade_engine_name, "").await
    }

    pub async fn new_with_dir_prefix(
        messenger: Arc<dyn PeerMessenger>,
        wallet: Arc<dyn TradeWallet>,
        trade_engine_name: impl AsRef<str>,
        dir_prefix: impl AsRef<Path>,
    ) -> Manager {
        let data_dir_path = dir_prefix
            .as_ref()
            .join("trade_engine_data")
            .join(trade_engine_name.as_ref());

        if let Some(error) = tokio::fs::create_dir_all(&data_dir_path).await.err() {
            error!(
                "Failed to create data directory {} - {}",
                data_dir_path.display().to_string(),
                error
            );
        }

        Manager {
            messenger,
            wallet,
            data_dir_path,
            protocols: RwLock::new(HashMap::new()),
            fallback_tx: RwLock::new(None),
        }
    }

    // Trade Management

    /// Taker entry point - the Trade comes into existence when an offer is taken.
    pub async fn take_offer(
        &self,
        side: TradeSide,
        terms: TradeTerms,
    ) -> Result<ProtocolAccess, TradeEngineError> {
        self.new_protocol(
            RoleVariant {
                role: TradeRole::Taker,
                side,
            },
            terms,
        )
        .await
    }

    /// Offerer entry point - the Trade comes into existence when a take-offer
    /// request is accepted.
    pub async fn accept_take_offer(
        &self,
        side: TradeSide,
        terms: TradeTerms,
    ) -> Result<ProtocolAccess, TradeEngineError> {
        self.new_protocol(
            RoleVariant {
                role: TradeRole::Offerer,
                side,
            },
            terms,
        )
        .await
    }

    async fn new_protocol(
        &self,
        role: RoleVariant,
        terms: TradeTerms,
    ) -> Result<ProtocolAccess, TradeEngineError> {
        let trade_uuid = terms.trade_uuid;
        let mut protocols = self.protocols.write().await;

        if protocols.contains_key(&trade_uuid) {
            return Err(TradeEngineError::Simple(format!(
                "Manager already contains Trade w/ TradeUUID {}",
                trade_uuid
            )));
        }

        let trade = Trade::new(role, ProcessModel::new(terms));
        let protocol = TradeProtocol::new(
            &self.data_dir_path,
            trade,
            self.messenger.clone(),
            self.wallet.clone(),
        );
        let access = protocol.new_accessor();
        protocols.insert(trade_uuid, protocol);

        Ok(access)
    }

    pub async fn get_protocols(&self) -> HashMap<Uuid, ProtocolAccess> {
        self.protocols
            .read()
            .await
            .iter()
            .map(|(trade_uuid, protocol)| (*trade_uuid, protocol.new_accessor()))
            .collect()
    }

    // Peer Message Routing

    /// Transport entry point - routes an inbound envelope to the protocol
    /// owning its trade UUID. Envelopes addressed to no known trade go to the
    /// registered fallback channel.
    pub async fn deliver_peer_message(&self, envelope: TradeMessageEnvelope) {
        let trade_uuid = envelope.message.trade_uuid();

        if let Some(protocol) = self.protocols.read().await.get(&trade_uuid) {
            if let Some(error) = protocol.envelope_tx().send(envelope).await.err() {
                error!(
                    "Manager failed routing peer message for Trade w/ TradeUUID {} - {}",
                    trade_uuid, error
                );
            }
            return;
        }

        if let Some(tx) = self.fallback_tx.read().await.as_ref() {
            if let Some(error) = tx.send(envelope).await.err() {
                error!(
                    "Manager failed sending peer message for TradeUUID {} to fallback - {}",
                    trade_uuid, error
                );
            }
            return;
        }

        warn!(
            "Manager dropping peer message for unknown TradeUUID {} - no fallback registered",
            trade_uuid
        );
    }

    pub async fn register_fallback_tx(
        &self,
        tx: mpsc::Sender<TradeMessageEnvelope>,
    ) -> Result<(), TradeEngineError> {
        let mut fallback_tx = self.fallback_tx.write().await;
        let mut result = Ok(());
        if fallback_tx.is_some() {
            result = Err(TradeEngineError::Simple(
                "Manager already have fallback_tx registered".to_string(),
            ));
        }
        *fallback_tx = Some(tx);
        result
    }

    pub async fn unregister_fallback_tx(&self) -> Result<(), TradeEngineError> {
        let mut fallback_tx = self.fallback_tx.write().await;
        let mut result = Ok(());
        if fallback_tx.is_none() {
            result = Err(TradeEngineError::Simple(
                "Manager expected to already have fallback_tx registered".to_string(),
            ));
        }
        *fallback_tx = None;
        result
    }

    // Restore

    /// Rebuilds protocol actors from trade records persisted in the data
    /// directory. Returns the trade UUIDs brought back.
    pub async fn restore(&self) -> Result<Vec<Uuid>, TradeEngineError> {
        let mut restored_uuids: Vec<Uuid> = Vec::new();
        let mut protocols = self.protocols.write().await;

        let mut dir_entries = tokio::fs::read_dir(&self.data_dir_path).await?;
        while let Some(dir_entry) = dir_entries.next_entry().await? {
            let data_path = dir_entry.path();
            let is_trade_data = data_path
                .file_name()
                .and_then(|file_name| file_name.to_str())
                .map(|file_name| file_name.ends_with("-trade.json"))
                .unwrap_or(false);
            if !is_trade_data {
                continue;
            }

            match TradeProtocol::restore(
                &data_path,
                self.messenger.clone(),
                self.wallet.clone(),
            ) {
                Ok((trade_uuid, protocol)) => {
                    protocols.insert(trade_uuid, protocol);
                    restored_uuids.push(trade_uuid);
                }
                Err(error) => {
                    error!(
                        "Manager failed restoring trade from {} - {}",
                        data_path.display().to_string(),
                        error
                    );
                }
            }
        }

        Ok(restored_uuids)
    }

    // Shutdown

    pub async fn shutdown(&self) -> Result<(), TradeEngineError> {
        let mut protocols = self.protocols.write().await;
        for (trade_uuid, protocol) in protocols.drain() {
            let access = protocol.new_accessor();
            if let Some(error) = access.shutdown().await.err() {
                error!(
                    "Manager failed shutting down protocol for Trade w/ TradeUUID {} - {}",
                    trade_uuid, error
                );
            }
            if let Some(error) = protocol.task_handle.await.err() {
                error!(
                    "Manager failed joining protocol task for Trade w/ TradeUUID {} - {}",
                    trade_uuid, error
                );
            }
        }
        Ok(())
    }
}
