//! Configuration section definitions.
//!
//! | Module     | TOML Section   | Purpose                                |
//! |------------|----------------|----------------------------------------|
//! | `session`  | `[session]`    | Trigger mode, retry delay, buffering   |
//! | `compiler` | `[compiler]`   | Front-end grouping, first-edit policy  |
//! | `device`   | `[device]`     | API level, runtime error polling       |

mod compiler;
mod device;
mod session;

pub use compiler::CompilerConfig;
pub use device::DeviceConfig;
pub use session::{SessionConfig, TriggerMode};
