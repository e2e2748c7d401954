//! Edit Worker - Single-Flight Edit Processing
//!
//! Owns the `LiveEditSession`. On wake-up it drains every message already
//! in the channel and handles them as one batch, so edits that arrive during
//! a compilation are folded into the next request instead of interrupting it.
//!
//! Compilation and pushes block, so each batch runs on the blocking pool
//! with the session moved in and back out.

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::messages::SessionMsg;
use crate::config::cfg;
use crate::session::{LiveEditSession, ProcessOutcome};

/// Which queue a retry drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Work {
    Pending,
    Trigger,
}

pub struct EditWorker {
    rx: mpsc::Receiver<SessionMsg>,
    session: Option<LiveEditSession>,
    /// Cancelled work and when to retry it.
    retry: Option<(Instant, Work)>,
}

impl EditWorker {
    pub fn new(rx: mpsc::Receiver<SessionMsg>, session: LiveEditSession) -> Self {
        Self {
            rx,
            session: Some(session),
            retry: None,
        }
    }

    /// Main event loop. Ends on `Shutdown` or when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased; // New messages take priority

                msg = self.rx.recv() => {
                    let Some(msg) = msg else { break };
                    let mut batch = vec![msg];
                    while let Ok(more) = self.rx.try_recv() {
                        batch.push(more);
                    }
                    if !self.handle(batch).await {
                        break;
                    }
                }

                work = wait_retry(self.retry) => {
                    self.retry = None;
                    crate::debug!("session"; "retrying cancelled compilation");
                    self.process(work).await;
                }
            }

            if self.session.is_none() {
                crate::log!("session"; "edit session lost, stopping");
                break;
            }
        }
        crate::debug!("session"; "worker stopped");
    }

    /// Apply a batch of messages. Returns false on shutdown.
    async fn handle(&mut self, batch: Vec<SessionMsg>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if batch.len() > 1 {
            crate::debug!("session"; "folding {} messages", batch.len());
        }

        let mut pending = false;
        let mut trigger = false;
        let mut flushes: Vec<oneshot::Sender<()>> = Vec::new();
        let mut running = true;

        for msg in batch {
            match msg {
                SessionMsg::Edit(event) => pending |= session.file_changed(event),
                SessionMsg::OpenFile { unit, tree } => session.open_file(&unit, &tree),
                SessionMsg::Deploy(deploy) => {
                    session.notify_app_deploy(*deploy);
                    self.retry = None;
                }
                SessionMsg::Refresh(device) => session.notify_app_refresh(&device),
                SessionMsg::Execution(devices) => {
                    session.notify_execution(&devices);
                }
                SessionMsg::Disconnected(device) => session.device_disconnected(&device),
                SessionMsg::Debugger { device, attached } => {
                    session.debugger_attached(&device, attached)
                }
                SessionMsg::SyncNeeded => session.sync_needed(),
                SessionMsg::SyncComplete => pending |= session.sync_complete(),
                SessionMsg::Trigger => trigger = true,
                SessionMsg::RequestRerun => session.request_rerun(),
                SessionMsg::ReloadConfig => match crate::config::reload_config() {
                    Ok(true) => {
                        crate::log!("config"; "reloaded");
                        session.set_config(&cfg());
                        pending |= session.has_pending();
                    }
                    Ok(false) => {}
                    Err(e) => crate::log!("config"; "reload failed: {e:#}"),
                },
                SessionMsg::Flush(reply) => flushes.push(reply),
                SessionMsg::Shutdown => {
                    running = false;
                    break;
                }
            }
        }

        if running {
            if pending {
                self.process(Work::Pending).await;
            }
            if trigger {
                self.process(Work::Trigger).await;
            }
        }

        for reply in flushes {
            let _ = reply.send(());
        }
        running
    }

    /// Compile on the blocking pool, scheduling a retry on cancellation.
    async fn process(&mut self, work: Work) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        let result = tokio::task::spawn_blocking(move || {
            let outcome = match work {
                Work::Pending => session.process_pending(),
                Work::Trigger => session.trigger(),
            };
            (session, outcome)
        })
        .await;

        let (session, outcome) = match result {
            Ok(done) => done,
            Err(e) => {
                crate::log!("session"; "edit task failed: {e}");
                return;
            }
        };

        if outcome.is_cancelled() {
            let delay = session.refresh_rate();
            crate::debug!("session"; "cancelled, retrying in {delay:?}");
            self.retry = Some((Instant::now() + delay, work));
        } else if let ProcessOutcome::Pushed { classes, devices } = outcome {
            crate::debug!("session"; "{classes} classes to {devices} devices");
        }
        self.session = Some(session);
    }
}

/// Wait for the scheduled retry (pending forever if none).
async fn wait_retry(retry: Option<(Instant, Work)>) -> Work {
    match retry {
        Some((at, work)) => {
            tokio::time::sleep_until(at).await;
            work
        }
        None => std::future::pending().await,
    }
}

// =============================================================================
// Tests
// =============================================================================
