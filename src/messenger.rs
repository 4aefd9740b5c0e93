use async_trait::async_trait;

use crate::common::error::TradeEngineError;
use crate::message::{PeerHandle, TradeMessage};

/// Asynchronous peer messaging collaborator. A send resolves exactly once with
/// either success or a transport fault; success carries no payload. Timeout and
/// retry are the transport's responsibility, not the protocol engine's.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerMessenger: Send + Sync {
    async fn send_trade_message(
        &self,
        peer: PeerHandle,
        message: TradeMessage,
    ) -> Result<(), TradeEngineError>;
}
