//! Device Status State Machine.
//!
//! | Module     | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `status`   | `DeviceStatus` and its error payloads          |
//! | `registry` | Shared status map, transitions and listeners   |
//! | `poll`     | Runtime error polling after pushes             |

mod poll;
mod registry;
mod status;

pub use poll::RecompositionPoller;
pub use registry::{DeviceInfo, DeviceRegistry, StatusListener, StatusSnapshot};
pub use status::{DeviceStatus, DisabledReason, ErrorOrigin, StatusError};

/// Lowest API level live edit supports.
pub const MIN_API_LEVEL: u32 = 30;

pub fn supports_live_edit(api_level: u32) -> bool {
    api_level >= MIN_API_LEVEL
}
