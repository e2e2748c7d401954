//! Actor System for Live Edit
//!
//! ```text
//! SessionHandle ──SessionMsg──> EditWorker ──> LiveEditSession
//!  (any task)        (mpsc)     (one batch at a time)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types sent to the worker
//! - `handle` - Cloneable sender side
//! - `worker` - Single-flight edit processing
//! - `coordinator` - Spawns the worker and handles shutdown

pub mod coordinator;
pub mod handle;
pub mod messages;
pub mod worker;

pub use coordinator::Coordinator;
pub use handle::{SessionClosed, SessionHandle};
pub use messages::SessionMsg;
