//! Session replay command.
//!
//! Drives a live edit session from a JSON script instead of an IDE and a
//! device. The front end returns the classes the script lists for each edit
//! and the transport records every patch.
//!
//! ```json
//! {
//!   "app_id": "com.example",
//!   "steps": [
//!     { "deploy": { "device": "emulator-5554", "api_level": 34 } },
//!     { "refresh": "emulator-5554" },
//!     { "edit": { "unit": "Main.kt", "classes": [ ... ] } },
//!     "sync_needed",
//!     { "wait_ms": 200 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::ReplayArgs;
use crate::actor::{Coordinator, SessionHandle};
use crate::compiler::{CompileRequest, FrontEnd, FrontEndError};
use crate::config::{EngineConfig, TriggerMode};
use crate::device::{DeviceRegistry, DeviceStatus, StatusSnapshot};
use crate::ir::{ArtifactSnapshot, ClassProvider, IrClass};
use crate::logger::{status_error, status_success, status_warning};
use crate::session::{AppDeploy, EditEvent, LiveEditSession};
use crate::syntax::SyntaxNode;
use crate::transport::{
    DeviceId, DeviceTransport, LiveEditMessage, PatchMessage, PushReport, RuntimeError,
    TransportError, UnsupportedChange, UnsupportedChangeKind,
};

// ============================================================================
// Script
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default = "default_app_id")]
    pub app_id: String,
    pub steps: Vec<Step>,
}

fn default_app_id() -> String {
    "app".to_string()
}

fn default_api_level() -> u32 {
    34
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Deploy {
        device: DeviceId,
        #[serde(default = "default_api_level")]
        api_level: u32,
        #[serde(default = "yes")]
        live_editable: bool,
        /// Deployed trees per source unit.
        #[serde(default)]
        seeds: BTreeMap<String, SyntaxNode>,
        /// Classes of the deployed build.
        #[serde(default)]
        artifact: Vec<IrClass>,
    },
    Open {
        unit: String,
        tree: SyntaxNode,
    },
    Edit {
        unit: String,
        #[serde(default)]
        module: String,
        #[serde(default)]
        declaration: Option<String>,
        #[serde(default)]
        tree: Option<SyntaxNode>,
        /// Classes the front end produces for the unit from now on.
        #[serde(default)]
        classes: Vec<IrClass>,
        /// Compilation error instead of classes.
        #[serde(default)]
        error: Option<String>,
    },
    Refresh(DeviceId),
    Execution(Vec<DeviceId>),
    Disconnect(DeviceId),
    Debugger {
        device: DeviceId,
        attached: bool,
    },
    SyncNeeded,
    SyncComplete,
    Trigger,
    RequestRerun,
    /// Re-read `liveedit.toml`.
    ReloadConfig,
    /// The device refuses its next patch.
    Reject {
        device: DeviceId,
        kind: UnsupportedChangeKind,
        #[serde(default)]
        message: String,
    },
    /// The device reports a runtime error on its next poll.
    RuntimeError {
        device: DeviceId,
        error: RuntimeError,
    },
    WaitMs(u64),
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid session script {}", path.display()))
    }
}

// ============================================================================
// Scripted collaborators
// ============================================================================

/// Front end answering with the classes the script set per unit.
#[derive(Default)]
pub struct ScriptedFrontEnd {
    outputs: Mutex<FxHashMap<String, Result<Vec<IrClass>, FrontEndError>>>,
}

impl ScriptedFrontEnd {
    fn set(&self, unit: &str, output: Result<Vec<IrClass>, FrontEndError>) {
        self.outputs.lock().insert(unit.to_string(), output);
    }
}

impl FrontEnd for ScriptedFrontEnd {
    fn compile(
        &self,
        requests: &[CompileRequest],
        _prior: &dyn ClassProvider,
    ) -> Result<Vec<IrClass>, FrontEndError> {
        let outputs = self.outputs.lock();
        let mut classes = Vec::new();
        for request in requests {
            match outputs.get(&request.source_unit) {
                Some(Ok(output)) => classes.extend(output.iter().cloned()),
                Some(Err(e)) => return Err(e.clone()),
                None => {}
            }
        }
        Ok(classes)
    }
}

/// Transport that records patches and replays scripted device replies.
#[derive(Default)]
pub struct RecordingTransport {
    pushes: Mutex<Vec<(DeviceId, PatchMessage)>>,
    rejections: Mutex<FxHashMap<DeviceId, UnsupportedChange>>,
    runtime_errors: Mutex<FxHashMap<DeviceId, Vec<RuntimeError>>>,
}

impl RecordingTransport {
    pub fn pushes(&self) -> Vec<(DeviceId, PatchMessage)> {
        self.pushes.lock().clone()
    }
}

impl DeviceTransport for RecordingTransport {
    fn push(&self, device: &str, patch: &PatchMessage) -> Result<PushReport, TransportError> {
        crate::log!(
            "push";
            "{device}: {} classes, {:?}",
            patch.classes.len() + patch.support_classes.len(),
            patch.invalidate_mode
        );
        self.pushes.lock().push((device.to_string(), patch.clone()));
        Ok(match self.rejections.lock().remove(device) {
            Some(change) => PushReport::rejected(change),
            None => PushReport::ok(),
        })
    }

    fn runtime_errors(&self, device: &str, _app_id: &str) -> Result<Vec<RuntimeError>, TransportError> {
        Ok(self.runtime_errors.lock().remove(device).unwrap_or_default())
    }
}

// ============================================================================
// Replay
// ============================================================================

/// Replay a session script and report the final device statuses.
pub async fn replay(args: &ReplayArgs, config: &EngineConfig) -> Result<()> {
    let script = Script::load(&args.script)?;
    let mut config = config.clone();
    if args.manual {
        config.session.trigger = TriggerMode::Manual;
    }

    let front_end = Arc::new(ScriptedFrontEnd::default());
    let transport = Arc::new(RecordingTransport::default());
    let registry = Arc::new(DeviceRegistry::new());
    registry.add_listener(status_printer());

    let session = LiveEditSession::new(front_end.clone(), transport.clone(), &config)
        .with_registry(Arc::clone(&registry));
    let (handle, task) = Coordinator::new(session).start();

    crate::log!("session"; "replaying {} steps", script.steps.len());
    for step in script.steps {
        run_step(step, &script.app_id, &handle, &front_end, &transport).await?;
        handle.flush().await?;
    }
    handle.shutdown().await?;
    task.await.context("edit worker panicked")?;

    let pushes = transport.pushes();
    if let Some(path) = &args.output {
        write_patches(path, &pushes)?;
    }
    report(&registry.snapshot(), pushes.len());
    Ok(())
}

async fn run_step(
    step: Step,
    app_id: &str,
    handle: &SessionHandle,
    front_end: &ScriptedFrontEnd,
    transport: &RecordingTransport,
) -> Result<()> {
    use crate::actor::SessionMsg;

    match step {
        Step::Deploy {
            device,
            api_level,
            live_editable,
            seeds,
            artifact,
        } => {
            let mut deploy = AppDeploy::new(app_id, device, api_level).live_editable(live_editable);
            for (unit, tree) in &seeds {
                deploy = deploy.with_seed(unit, tree);
            }
            if !artifact.is_empty() {
                deploy = deploy.with_artifact(Arc::new(ArtifactSnapshot::new(artifact)));
            }
            handle.deploy(deploy).await?;
        }
        Step::Open { unit, tree } => handle.open_file(unit, tree).await?,
        Step::Edit {
            unit,
            module,
            declaration,
            tree,
            classes,
            error,
        } => {
            let output = match error {
                Some(detail) => Err(FrontEndError::Compilation {
                    unit: unit.clone(),
                    detail,
                }),
                None => Ok(classes),
            };
            front_end.set(&unit, output);

            let mut event = EditEvent::new(unit).in_module(module);
            if let Some(declaration) = declaration {
                event = event.for_declaration(declaration);
            }
            if let Some(tree) = tree {
                event = event.with_tree(tree);
            }
            handle.edit(event).await?;
        }
        Step::Refresh(device) => handle.refresh(device).await?,
        Step::Execution(devices) => handle.execution(devices).await?,
        Step::Disconnect(device) => handle.send(SessionMsg::Disconnected(device)).await?,
        Step::Debugger { device, attached } => {
            handle.send(SessionMsg::Debugger { device, attached }).await?
        }
        Step::SyncNeeded => handle.send(SessionMsg::SyncNeeded).await?,
        Step::SyncComplete => handle.send(SessionMsg::SyncComplete).await?,
        Step::Trigger => handle.trigger().await?,
        Step::RequestRerun => handle.send(SessionMsg::RequestRerun).await?,
        Step::ReloadConfig => handle.send(SessionMsg::ReloadConfig).await?,
        Step::Reject {
            device,
            kind,
            message,
        } => {
            transport
                .rejections
                .lock()
                .insert(device, UnsupportedChange::new(kind, message));
        }
        Step::RuntimeError { device, error } => {
            transport.runtime_errors.lock().entry(device).or_default().push(error);
        }
        Step::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
    }
    Ok(())
}

/// Listener logging each device whose status changed.
fn status_printer() -> impl Fn(&StatusSnapshot) + Send + Sync + 'static {
    let last = Mutex::new(StatusSnapshot::new());
    move |snapshot| {
        let mut last = last.lock();
        for (device, status) in snapshot {
            if last.get(device) != Some(status) {
                crate::log!("device"; "{device}: {status}");
            }
        }
        *last = snapshot.clone();
    }
}

fn write_patches(path: &Path, pushes: &[(DeviceId, PatchMessage)]) -> Result<()> {
    let mut file = std::io::BufWriter::new(
        std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    for (_, patch) in pushes {
        writeln!(file, "{}", LiveEditMessage::patch(patch.clone()).to_json()?)?;
    }
    file.flush()?;
    crate::debug!("replay"; "wrote {} patches to {}", pushes.len(), path.display());
    Ok(())
}

fn report(snapshot: &StatusSnapshot, pushes: usize) {
    let failing: Vec<String> = snapshot
        .iter()
        .filter(|(_, status)| {
            !matches!(
                status,
                DeviceStatus::UpToDate | DeviceStatus::Loading | DeviceStatus::Disabled(_)
            )
        })
        .map(|(device, status)| format!("{device}: {status}"))
        .collect();

    if snapshot.is_empty() {
        status_warning("no device was deployed");
    } else if failing.is_empty() {
        status_success(&format!("{pushes} patch(es) pushed, every device up to date"));
    } else {
        status_error(&format!("{pushes} patch(es) pushed"), &failing.join("\n"));
    }
}

// ============================================================================
// Tests
// ============================================================================
