mod messenger;
mod testing;
mod wallet;

pub use messenger::*;
pub use testing::*;
pub use wallet::*;
