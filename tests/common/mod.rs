pub mod logger;
pub mod trade_testers;

use std::path::PathBuf;

use uuid::Uuid;

// Unique data dir per test so persisted trade records never collide
pub fn some_data_dir_prefix() -> PathBuf {
    std::env::temp_dir().join(format!("crusty-trade-engine-test-{}", Uuid::new_v4()))
}
