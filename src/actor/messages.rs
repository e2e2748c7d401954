//! Actor Message Definitions
//!
//! ```text
//! SessionHandle --SessionMsg--> EditWorker (owns LiveEditSession)
//! ```

use tokio::sync::oneshot;

use crate::session::{AppDeploy, EditEvent};
use crate::syntax::SyntaxNode;
use crate::transport::DeviceId;

/// Messages to the Edit Worker
#[derive(Debug)]
pub enum SessionMsg {
    /// A source unit was edited
    Edit(EditEvent),
    /// A source unit was opened in the editor
    OpenFile {
        unit: String,
        /// Boxed to keep the enum small
        tree: Box<SyntaxNode>,
    },
    /// App installed on a device
    Deploy(Box<AppDeploy>),
    /// Apply-changes refresh finished on a device
    Refresh(DeviceId),
    /// A run started on these devices
    Execution(Vec<DeviceId>),
    Disconnected(DeviceId),
    Debugger { device: DeviceId, attached: bool },
    SyncNeeded,
    SyncComplete,
    /// Manual mode: compile buffered edits
    Trigger,
    RequestRerun,
    /// `liveedit.toml` changed on disk
    ReloadConfig,
    /// Reply once every earlier message has been handled
    Flush(oneshot::Sender<()>),
    Shutdown,
}
