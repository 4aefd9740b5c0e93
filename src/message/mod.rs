mod trade_message;

pub use trade_message::*;
