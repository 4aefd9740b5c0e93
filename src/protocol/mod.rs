mod process_model;
mod protocol;
mod registry;
mod task_runner;
mod tasks;

pub use process_model::{CounterpartyModel, ProcessModel, TradeTerms};
pub use protocol::{ProtocolAccess, TradeNotif};

pub(crate) use protocol::TradeProtocol;
