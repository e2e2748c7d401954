//! Runtime error polling after a successful push.
//!
//! Recomposition errors only surface once the app re-renders, so after each
//! push the devices are asked for runtime errors a few times. A new push
//! while polls are outstanding resets the budget instead of starting a
//! second loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::registry::DeviceRegistry;
use super::status::DeviceStatus;
use crate::transport::DeviceTransport;

pub struct RecompositionPoller {
    /// Polls left in the current loop; zero when no loop runs.
    pending: Arc<AtomicUsize>,
    polls_per_push: usize,
    interval: Duration,
}

impl RecompositionPoller {
    pub fn new(polls_per_push: usize, interval: Duration) -> Self {
        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            polls_per_push,
            interval,
        }
    }

    /// Change the budget and interval of later loops. A loop already running
    /// keeps sharing the budget, so the next push still resets it.
    pub fn reconfigure(&mut self, polls_per_push: usize, interval: Duration) {
        self.polls_per_push = polls_per_push;
        self.interval = interval;
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Reset the poll budget, starting a loop if none is running.
    ///
    /// Returns the loop's handle when a new one was spawned. Without a tokio
    /// runtime nothing is polled.
    pub fn schedule(
        &self,
        registry: Arc<DeviceRegistry>,
        transport: Arc<dyn DeviceTransport>,
        app_id: String,
    ) -> Option<JoinHandle<()>> {
        if self.polls_per_push == 0 {
            return None;
        }
        if self.pending.swap(self.polls_per_push, Ordering::SeqCst) > 0 {
            crate::debug!("device"; "poll budget reset to {}", self.polls_per_push);
            return None;
        }

        let Ok(runtime) = Handle::try_current() else {
            self.pending.store(0, Ordering::SeqCst);
            crate::debug!("device"; "no runtime, skipping recomposition polling");
            return None;
        };

        let pending = Arc::clone(&self.pending);
        let interval = self.interval;
        Some(runtime.spawn(async move {
            poll_loop(pending, interval, registry, transport, app_id).await;
        }))
    }
}

async fn poll_loop(
    pending: Arc<AtomicUsize>,
    interval: Duration,
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn DeviceTransport>,
    app_id: String,
) {
    loop {
        tokio::time::sleep(interval).await;
        let left = decrement(&pending);

        let devices = registry.editable_devices();
        let query = Arc::clone(&transport);
        let app = app_id.clone();
        let results = match tokio::task::spawn_blocking(move || {
            devices
                .into_iter()
                .map(|device| {
                    let result = query.runtime_errors(&device, &app);
                    (device, result)
                })
                .collect::<Vec<_>>()
        })
        .await
        {
            Ok(results) => results,
            Err(e) => {
                crate::log!("device"; "runtime error query failed: {e}");
                pending.store(0, Ordering::SeqCst);
                break;
            }
        };

        let mut failed = false;
        for (device, result) in results {
            match result {
                Ok(errors) => {
                    if let Some(error) = errors.first() {
                        crate::log!("device"; "{device}: {}: {}", error.exception, error.message);
                        registry.update_editable_device(&device, DeviceStatus::recomposition_error(error));
                    }
                }
                Err(e) => {
                    crate::log!("device"; "{device}: {e}");
                    registry.update_editable_device(&device, DeviceStatus::retrieval_error(&e));
                    failed = true;
                }
            }
        }

        if failed {
            pending.store(0, Ordering::SeqCst);
            break;
        }
        if left == 0 {
            break;
        }
    }
}

/// Decrement without wrapping; returns the remaining count.
fn decrement(pending: &AtomicUsize) -> usize {
    let previous = pending
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
        .unwrap_or(0);
    previous.saturating_sub(1)
}

// =============================================================================
// Tests
// =============================================================================
