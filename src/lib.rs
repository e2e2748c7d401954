//! Live Edit: incremental hot-swap compilation for running applications.
//!
//! | Module      | Purpose                                               |
//! |-------------|-------------------------------------------------------|
//! | `ir`        | Compiled class model, body hashes, class cache        |
//! | `syntax`    | Syntax tree handed over by the front end              |
//! | `validate`  | Structural validator (pre-compile rejection)          |
//! | `differ`    | Class differ (post-compile rejection)                 |
//! | `compiler`  | Live edit compiler: compile, diff, classify           |
//! | `transport` | Device collaborator and agent message protocol        |
//! | `device`    | Device status state machine and runtime-error polling |
//! | `session`   | Edit queue, manual mode, deploy lifecycle             |
//! | `actor`     | Single-flight edit worker                             |
//! | `config`    | `liveedit.toml`                                       |
//! | `cli`       | `replay` and `check` commands                         |

pub mod actor;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod device;
pub mod differ;
pub mod ir;
pub mod logger;
pub mod session;
pub mod syntax;
pub mod transport;
pub mod validate;

pub use compiler::{CompileOutcome, LiveEditCompiler, LiveEditCompilerOutput};
pub use device::{DeviceRegistry, DeviceStatus};
pub use session::{AppDeploy, EditEvent, LiveEditSession};
