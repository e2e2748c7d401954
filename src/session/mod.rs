//! Live edit session of one project.
//!
//! Owns everything the edit-processing path mutates: the compiler, the
//! IrClassCache, the validation snapshots and the pending edits. The device
//! registry is shared with the runtime-error poller.
//!
//! ```text
//! file_changed ──> queue (auto) ──> process_pending ──> compile ──> push
//!      │                                  │                         │
//!      └──> buffer (manual) ──> trigger ──┘            status + schedule polls
//! ```
//!
//! | Module      | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `event`     | `EditEvent`                                    |
//! | `queue`     | Coalescing FIFO of pending edits               |
//! | `lifecycle` | Deploy, execution, sync and debugger hooks     |

mod event;
mod lifecycle;
mod queue;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

pub use event::EditEvent;
pub use lifecycle::AppDeploy;
pub use queue::EditQueue;

use crate::compiler::{
    CompileInput, CompileOutcome, ErrorKind, FrontEnd, LiveEditCompiler, LiveEditCompilerOutput,
    LiveEditUpdateException, error_message, file_error_message,
};
use crate::config::{DeviceConfig, EngineConfig, SessionConfig};
use crate::device::{DeviceRegistry, DeviceStatus, ErrorOrigin, RecompositionPoller};
use crate::ir::IrClassCache;
use crate::logger;
use crate::transport::{DeviceTransport, PatchMessage, UnsupportedChangeKind};
use crate::validate::{ValidationState, observe};

/// Buffer overflow in manual mode.
const TOO_MANY_EDITS: &str = "Too many buffered LE keystrokes. Redeploy app.";

/// Result of processing a batch of edits.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Nothing was pending.
    Idle,
    /// Patch pushed to the editable devices.
    Pushed { classes: usize, devices: usize },
    /// Compilation failed; the status already reflects it.
    Failed(LiveEditUpdateException),
    /// The front end cancelled; the batch is pending again.
    Cancelled,
}

impl ProcessOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub struct LiveEditSession {
    app_id: Option<String>,
    compiler: LiveEditCompiler,
    cache: IrClassCache,
    /// Validator state per source unit, captured at deploy or file open.
    snapshots: DashMap<String, Arc<ValidationState>>,
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn DeviceTransport>,
    poller: RecompositionPoller,
    config: SessionConfig,
    device: DeviceConfig,
    /// Auto mode: edits waiting for the next batch.
    queue: EditQueue,
    /// Manual mode: edits waiting for a trigger.
    buffer: EditQueue,
    /// Units whose last compile failed with a recoverable error.
    files_with_errors: BTreeSet<String>,
}

impl LiveEditSession {
    pub fn new(
        front_end: Arc<dyn FrontEnd>,
        transport: Arc<dyn DeviceTransport>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            app_id: None,
            compiler: LiveEditCompiler::new(front_end).with_config(config.compiler.clone()),
            cache: IrClassCache::new(),
            snapshots: DashMap::new(),
            registry: Arc::new(DeviceRegistry::new()),
            transport,
            poller: RecompositionPoller::new(
                config.device.poll_count,
                config.device.poll_interval(),
            ),
            config: config.session.clone(),
            device: config.device.clone(),
            queue: EditQueue::new(),
            buffer: EditQueue::new(),
            files_with_errors: BTreeSet::new(),
        }
    }

    /// Share an existing registry (e.g. one with listeners attached).
    pub fn with_registry(mut self, registry: Arc<DeviceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Apply a reloaded config. Switching to auto mode moves buffered edits
    /// to the queue.
    pub fn set_config(&mut self, config: &EngineConfig) {
        if self.config.is_manual() && !config.session.is_manual() {
            self.queue.extend(self.buffer.drain());
        }
        self.config = config.session.clone();
        self.device = config.device.clone();
        self.poller
            .reconfigure(config.device.poll_count, config.device.poll_interval());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn registry(&self) -> Arc<DeviceRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn cache(&self) -> &IrClassCache {
        &self.cache
    }

    /// Delay before a cancelled batch is retried.
    pub fn refresh_rate(&self) -> Duration {
        self.config.refresh_rate()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn files_with_errors(&self) -> &BTreeSet<String> {
        &self.files_with_errors
    }

    pub fn snapshot(&self, unit: &str) -> Option<Arc<ValidationState>> {
        self.snapshots.get(unit).map(|s| Arc::clone(&s))
    }

    /// Live edit is possible: an app is deployed, some device can receive
    /// patches and none needs a redeploy.
    pub fn should_live_edit(&self) -> bool {
        self.app_id.is_some() && !self.registry.is_unrecoverable() && !self.registry.is_disabled()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Record a snapshot for a unit opened after deploy.
    pub fn open_file(&self, unit: &str, tree: &crate::syntax::SyntaxNode) {
        self.snapshots
            .entry(unit.to_string())
            .or_insert_with(|| Arc::new(ValidationState::capture(tree)));
    }

    /// Accept an edit. Returns whether a batch is ready for `process_pending`.
    pub fn file_changed(&mut self, mut event: EditEvent) -> bool {
        if self.registry.has_unsupported_api() {
            self.registry.update_with(|_, status| match status {
                DeviceStatus::UnsupportedVersion => status.clone(),
                _ => DeviceStatus::UnsupportedVersionOtherDevice,
            });
            return false;
        }
        if !self.should_live_edit() {
            crate::debug!("session"; "ignoring edit of {}", event.source_unit);
            return false;
        }

        if let (Some(tree), Some(snapshot)) = (&event.tree, self.snapshot(&event.source_unit)) {
            event.unsupported = observe(&snapshot, &ValidationState::capture(tree));
            if !event.unsupported.is_empty() {
                let kinds: Vec<_> = event.unsupported.iter().map(|k| k.label()).collect();
                crate::debug!("session"; "{} touches {}", event.source_unit, kinds.join(", "));
            }
        }

        if self.config.is_manual() {
            if self.buffer.len() >= self.config.max_buffered_edits {
                self.registry
                    .update_editable(DeviceStatus::rerunnable(TOO_MANY_EDITS, ErrorOrigin::Session));
                return false;
            }
            self.buffer.push(event);
            self.registry.update_editable(DeviceStatus::OutOfDate);
            return false;
        }

        self.queue.push(event);
        !self.registry.is_sync_needed()
    }

    /// Compile and push everything queued in auto mode.
    pub fn process_pending(&mut self) -> ProcessOutcome {
        if self.queue.is_empty() {
            return ProcessOutcome::Idle;
        }
        let batch = self.queue.drain();
        crate::debug!("session"; "processing {} edits", batch.len());
        self.registry.update_editable(DeviceStatus::InProgress);

        let outcome = self.process_changes(&batch);
        if outcome.is_cancelled() {
            self.queue.requeue(batch);
        }
        outcome
    }

    /// Manual mode: compile and push the buffered edits.
    pub fn trigger(&mut self) -> ProcessOutcome {
        if self.buffer.is_empty() {
            return ProcessOutcome::Idle;
        }
        let batch = self.buffer.drain();
        self.registry.update_editable(DeviceStatus::InProgress);

        let outcome = self.process_changes(&batch);
        if outcome.is_cancelled() {
            self.buffer.requeue(batch);
        }
        outcome
    }

    fn process_changes(&mut self, batch: &[EditEvent]) -> ProcessOutcome {
        let inputs: Vec<CompileInput> = batch.iter().map(|e| self.input_for(e)).collect();

        match self.compiler.compile(&inputs, &mut self.cache) {
            Ok(CompileOutcome::Cancelled) => ProcessOutcome::Cancelled,
            Ok(CompileOutcome::Compiled(output)) => {
                for event in batch {
                    self.files_with_errors.remove(&event.source_unit);
                }
                self.push(&output)
            }
            Err(error) => {
                self.report_error(&error, batch);
                ProcessOutcome::Failed(error)
            }
        }
    }

    fn input_for(&self, event: &EditEvent) -> CompileInput {
        let input = CompileInput::new(event.request());
        match (&event.tree, self.snapshot(&event.source_unit)) {
            (Some(tree), Some(snapshot)) => {
                input.with_states(snapshot, ValidationState::capture(tree))
            }
            _ => input,
        }
    }

    fn report_error(&mut self, error: &LiveEditUpdateException, batch: &[EditEvent]) {
        let message = error_message(error);
        if error.is_recoverable() {
            self.files_with_errors
                .extend(batch.iter().map(|e| e.source_unit.clone()));
            self.registry.update_editable(DeviceStatus::paused(&message));
            logger::status_warning(&message);
        } else {
            self.registry
                .update_editable(DeviceStatus::rerunnable(&message, ErrorOrigin::Compile));
            logger::status_error(error.error.title(), &error.details);
        }
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Status of a device that accepted the latest patch.
    fn status_after_push(&self) -> DeviceStatus {
        match self.files_with_errors.first() {
            Some(file) if !self.config.confined_analysis => {
                DeviceStatus::paused(file_error_message(ErrorKind::CompilationError, file))
            }
            _ => DeviceStatus::UpToDate,
        }
    }

    fn push(&mut self, output: &LiveEditCompilerOutput) -> ProcessOutcome {
        let Some(app_id) = self.app_id.clone() else {
            return ProcessOutcome::Idle;
        };
        if output.is_empty() {
            self.registry.update_editable(self.status_after_push());
            return ProcessOutcome::Pushed {
                classes: 0,
                devices: 0,
            };
        }

        let patch = PatchMessage::new(&app_id, output).with_debug(self.device.debug_mode);
        let mut accepted = 0;
        for device in self.registry.editable_devices() {
            let status = match self.transport.push(&device, &patch) {
                Ok(report) => match report.first_error() {
                    None => {
                        accepted += 1;
                        self.status_after_push()
                    }
                    Some(change) if change.kind == UnsupportedChangeKind::UnsupportedComposeVersion => {
                        DeviceStatus::rerunnable(&change.message, ErrorOrigin::ComposeVersion)
                    }
                    Some(change) => DeviceStatus::rerunnable(change.to_string(), ErrorOrigin::Push),
                },
                Err(e) => DeviceStatus::rerunnable(e.to_string(), ErrorOrigin::Push),
            };
            crate::log!("push"; "{device}: {status}");
            self.registry.update_editable_device(&device, status);
        }

        if accepted > 0 {
            logger::status_success(&format!(
                "{} classes pushed to {accepted} device(s)",
                output.class_count()
            ));
            self.poller
                .schedule(self.registry(), Arc::clone(&self.transport), app_id);
        }

        ProcessOutcome::Pushed {
            classes: output.class_count(),
            devices: accepted,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
