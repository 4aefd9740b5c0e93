mod closing;
mod contract;
mod deposit;
mod fiat;
mod payout;

pub(crate) use closing::*;
pub(crate) use contract::*;
pub(crate) use deposit::*;
pub(crate) use fiat::*;
pub(crate) use payout::*;

use uuid::Uuid;

use crate::common::error::TradeEngineError;
use crate::protocol::task_runner::TaskFailure;

// Any required field missing at message/transaction assembly time converts
// into an exception failure - it must never propagate uncaught.
fn required<T>(trade_uuid: Uuid, field: &str, value: Option<T>) -> Result<T, TaskFailure> {
    value.ok_or_else(|| {
        TaskFailure::exception(TradeEngineError::Simple(format!(
            "Trade w/ TradeUUID {} missing required {}",
            trade_uuid, field
        )))
    })
}
