//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! delay_ms = 100   # debounce window per asset class
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub delay_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { delay_ms: 100 }
    }
}

impl WatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
