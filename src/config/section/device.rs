//! `[device]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [device]
//! min_api_level = 30        # older devices report an unsupported version
//! poll_count = 5            # runtime error polls after each push
//! poll_interval_ms = 2000
//! debug_mode = false        # agent logs verbosely
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::device::MIN_API_LEVEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub min_api_level: u32,
    pub poll_count: usize,
    pub poll_interval_ms: u64,
    pub debug_mode: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            min_api_level: MIN_API_LEVEL,
            poll_count: 5,
            poll_interval_ms: 2000,
            debug_mode: false,
        }
    }
}

impl DeviceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn supports(&self, api_level: u32) -> bool {
        api_level >= self.min_api_level
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.poll_count == 0 {
            diag.error(FieldPath::new("device.poll_count"), "must be greater than 0");
        }
        if self.poll_interval_ms == 0 {
            diag.error(
                FieldPath::new("device.poll_interval_ms"),
                "must be greater than 0",
            );
        }
        if self.min_api_level < MIN_API_LEVEL {
            diag.error_with_hint(
                FieldPath::new("device.min_api_level"),
                format!("live edit needs API level {MIN_API_LEVEL} or newer"),
                format!("remove the field or set it to at least {MIN_API_LEVEL}"),
            );
        }
    }
}
