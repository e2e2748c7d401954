//! Actor Coordinator - Wires up the Edit Worker
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates the session channel
//! - Spawns the worker
//! - Stops it on the shutdown signal

mod runtime;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::handle::SessionHandle;
use super::messages::SessionMsg;
use super::worker::EditWorker;
use crate::session::LiveEditSession;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the edit worker.
pub struct Coordinator {
    session: LiveEditSession,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(session: LiveEditSession) -> Self {
        Self {
            session,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn start(self) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel::<SessionMsg>(CHANNEL_BUFFER);
        let worker = EditWorker::new(rx, self.session);

        crate::debug!("actor"; "start");
        let signal = self.shutdown_rx.map(|shutdown| (shutdown, tx.clone()));
        let task = tokio::spawn(async move {
            runtime::run_worker(worker, signal).await;
            crate::debug!("actor"; "stopped");
        });
        (SessionHandle::new(tx), task)
    }
}

// =============================================================================
// Tests
// =============================================================================
