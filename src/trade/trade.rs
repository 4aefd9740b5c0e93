use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::protocol::ProcessModel;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    IntoStaticStr,
)]
pub enum TradeRole {
    Offerer,
    Taker,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    IntoStaticStr,
)]
pub enum TradeSide {
    Buyer,
    Seller,
}

/// Tagged {role, side} variant identifying one of the four symmetric role
/// combinations. Owns the transition table - see `sequence_for()` in the
/// protocol registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleVariant {
    pub role: TradeRole,
    pub side: TradeSide,
}

impl fmt::Display for RoleVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-as-{}", self.role, self.side)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    IntoStaticStr,
)]
pub enum ProcessState {
    Init,
    DepositTxPublishRequested,
    DepositTxPublished,
    DepositTxConfirmed,
    FiatPaymentStarted,
    FiatPaymentReceiptConfirmed,
    PayoutTxPublished,
    Completed,
    MessageSendingFailed,
    ValidationFailed,
    TaskException,
    DisputeOpened,
}

impl ProcessState {
    fn happy_path_index(&self) -> Option<u8> {
        match self {
            ProcessState::Init => Some(0),
            ProcessState::DepositTxPublishRequested => Some(1),
            ProcessState::DepositTxPublished => Some(2),
            ProcessState::DepositTxConfirmed => Some(3),
            ProcessState::FiatPaymentStarted => Some(4),
            ProcessState::FiatPaymentReceiptConfirmed => Some(5),
            ProcessState::PayoutTxPublished => Some(6),
            ProcessState::Completed => Some(7),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProcessState::MessageSendingFailed
                | ProcessState::ValidationFailed
                | ProcessState::TaskException
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Completed | ProcessState::DisputeOpened)
    }

    /// Happy path transitions must advance - skips allowed, regressions rejected.
    /// Failure states are reachable from any in-flight step; a dispute can be
    /// opened from anywhere except a terminal state; nothing leaves a terminal
    /// state.
    pub fn can_transition_to(&self, next: ProcessState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == ProcessState::DisputeOpened {
            return true;
        }
        if self.is_failure() {
            return false;
        }
        if next.is_failure() {
            return true;
        }
        match (self.happy_path_index(), next.happy_path_index()) {
            (Some(current_index), Some(next_index)) => next_index > current_index,
            _ => false,
        }
    }
}

/// One trade's persistent record. The trade UUID never changes after creation;
/// the error log is append-only and never cleared between failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trade {
    pub trade_uuid: Uuid,
    pub role: RoleVariant,
    pub state: ProcessState,
    pub error_log: Vec<String>,
    pub failure_cause: Option<String>,
    pub process_model: ProcessModel,
}

impl Trade {
    pub(crate) fn new(role: RoleVariant, process_model: ProcessModel) -> Self {
        Self {
            trade_uuid: process_model.trade_uuid(),
            role,
            state: ProcessState::Init,
            error_log: Vec::new(),
            failure_cause: None,
            process_model,
        }
    }
}
