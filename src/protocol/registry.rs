use std::fmt;

use strum_macros::{Display, IntoStaticStr};

use crate::message::TradeMessage;
use crate::protocol::task_runner::Task;
use crate::protocol::tasks::*;
use crate::trade::{ProcessState, RoleVariant, TradeRole, TradeSide};

/// Local user-initiated triggers, as written into the protocol entry point by
/// the presentation collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, IntoStaticStr)]
pub(crate) enum UserAction {
    TakeOffer,
    DepositTxConfirmed,
    FiatPaymentStarted,
    FiatPaymentReceived,
    CompleteTrade,
    OpenDispute,
}

/// A trigger is either a local user action or an inbound protocol message.
#[derive(Clone, Debug)]
pub(crate) enum TradeTrigger {
    User(UserAction),
    Message(TradeMessage),
}

impl TradeTrigger {
    pub(crate) fn message(&self) -> Option<TradeMessage> {
        match self {
            TradeTrigger::User(_) => None,
            TradeTrigger::Message(message) => Some(message.clone()),
        }
    }
}

impl fmt::Display for TradeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TradeTrigger::User(action) => write!(f, "UserAction-{}", action),
            TradeTrigger::Message(message) => write!(f, "Message-{}", message),
        }
    }
}

/// An ordered task sequence plus the state the trade advances to when every
/// task in it signals success.
pub(crate) struct TaskSequence {
    pub(crate) tasks: Vec<Box<dyn Task>>,
    pub(crate) success_state: ProcessState,
}

impl RoleVariant {
    /// The single dispatch point of the protocol: the task sequence registered
    /// for this role variant, the trade's current state and the trigger. None
    /// means the combination is not a registered transition - the dispatcher
    /// drops inbound messages and rejects user actions accordingly, leaving
    /// state untouched. This is the defense against duplicate and out-of-order
    /// delivery from the transport layer.
    pub(crate) fn sequence_for(
        &self,
        state: ProcessState,
        trigger: &TradeTrigger,
    ) -> Option<TaskSequence> {
        use ProcessState::*;
        use TradeRole::*;
        use TradeSide::*;

        match (self.role, self.side, state, trigger) {
            (Taker, _, Init, TradeTrigger::User(UserAction::TakeOffer)) => Some(TaskSequence {
                tasks: vec![
                    Box::new(PrepareTradeContract),
                    Box::new(PrepareDepositTx),
                    Box::new(SendDepositTxPublishRequest),
                ],
                success_state: DepositTxPublishRequested,
            }),

            (
                Offerer,
                _,
                Init,
                TradeTrigger::Message(TradeMessage::DepositTxPublishRequest(_)),
            ) => Some(TaskSequence {
                tasks: vec![
                    Box::new(ProcessDepositTxPublishRequest),
                    Box::new(SignAndPublishDepositTx),
                    Box::new(SendDepositTxPublished),
                ],
                success_state: DepositTxPublished,
            }),

            (
                Taker,
                _,
                DepositTxPublishRequested,
                TradeTrigger::Message(TradeMessage::DepositTxPublished { .. }),
            ) => Some(TaskSequence {
                tasks: vec![Box::new(ProcessDepositTxPublished)],
                success_state: DepositTxPublished,
            }),

            (_, _, DepositTxPublished, TradeTrigger::User(UserAction::DepositTxConfirmed)) => {
                Some(TaskSequence {
                    tasks: vec![Box::new(RecordDepositTxConfirmation)],
                    success_state: DepositTxConfirmed,
                })
            }

            (_, Buyer, DepositTxConfirmed, TradeTrigger::User(UserAction::FiatPaymentStarted)) => {
                Some(TaskSequence {
                    tasks: vec![Box::new(SendFiatPaymentStarted)],
                    success_state: FiatPaymentStarted,
                })
            }

            (
                _,
                Seller,
                DepositTxConfirmed,
                TradeTrigger::Message(TradeMessage::FiatPaymentStarted { .. }),
            ) => Some(TaskSequence {
                tasks: vec![Box::new(ProcessFiatPaymentStarted)],
                success_state: FiatPaymentStarted,
            }),

            (
                _,
                Seller,
                FiatPaymentStarted,
                TradeTrigger::User(UserAction::FiatPaymentReceived),
            ) => Some(TaskSequence {
                tasks: vec![
                    Box::new(SendFiatPaymentReceived),
                    Box::new(SignAndPublishPayoutTx),
                    Box::new(SendPayoutTxPublished),
                ],
                success_state: PayoutTxPublished,
            }),

            (
                _,
                Buyer,
                FiatPaymentStarted,
                TradeTrigger::Message(TradeMessage::FiatPaymentReceived { .. }),
            ) => Some(TaskSequence {
                tasks: vec![Box::new(ProcessFiatPaymentReceived)],
                success_state: FiatPaymentReceiptConfirmed,
            }),

            (
                _,
                Buyer,
                FiatPaymentReceiptConfirmed,
                TradeTrigger::Message(TradeMessage::PayoutTxPublished { .. }),
            ) => Some(TaskSequence {
                tasks: vec![Box::new(ProcessPayoutTxPublished)],
                success_state: PayoutTxPublished,
            }),

            (_, _, PayoutTxPublished, TradeTrigger::User(UserAction::CompleteTrade)) => {
                Some(TaskSequence {
                    tasks: vec![Box::new(CompleteTrade)],
                    success_state: Completed,
                })
            }

            (_, _, current_state, TradeTrigger::User(UserAction::OpenDispute))
                if !current_state.is_terminal() =>
            {
                Some(TaskSequence {
                    tasks: vec![Box::new(OpenDispute)],
                    success_state: DisputeOpened,
                })
            }

            _ => None,
        }
    }
}
