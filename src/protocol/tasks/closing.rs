use async_trait::async_trait;
use tracing::info;

use crate::protocol::task_runner::{Task, TaskContext, TaskFailure};

use super::required;

/// Final bookkeeping once the payout transaction is out. The trade record is
/// immutable afterwards except for archival persistence.
pub(crate) struct CompleteTrade;

#[async_trait]
impl Task for CompleteTrade {
    fn name(&self) -> &'static str {
        "CompleteTrade"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        required(context.trade_uuid, "Payout Tx", context.model.payout_tx())?;
        Ok(())
    }
}

/// Terminal handoff into arbitration. Dispute resolution itself lives outside
/// the protocol engine.
pub(crate) struct OpenDispute;

#[async_trait]
impl Task for OpenDispute {
    fn name(&self) -> &'static str {
        "OpenDispute"
    }

    async fn run(&self, context: &mut TaskContext) -> Result<(), TaskFailure> {
        info!(
            "Trade w/ TradeUUID {} handing off to dispute resolution",
            context.trade_uuid
        );
        Ok(())
    }
}
