pub mod common;
pub mod contract;
pub mod manager;
pub mod message;
pub mod messenger;
pub mod protocol;
pub mod testing;
pub mod trade;
pub mod wallet;
