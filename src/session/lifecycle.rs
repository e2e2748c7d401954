//! Deploy, execution and device hooks of a session.

use std::fmt;
use std::sync::Arc;

use super::LiveEditSession;
use crate::device::{DeviceInfo, DeviceStatus, ErrorOrigin};
use crate::ir::{ClassProvider, EmptyProvider};
use crate::syntax::SyntaxNode;
use crate::transport::DeviceId;
use crate::validate::ValidationState;

const RERUN_MESSAGE: &str = "Re-run application to start Live Edit updates.";

/// An app was installed and started on a device.
pub struct AppDeploy {
    pub app_id: String,
    pub device: DeviceId,
    pub api_level: u32,
    /// The build supports live edit (debuggable, runtime agent present).
    pub live_editable: bool,
    /// Trees of the deployed sources, used as validation snapshots.
    pub seed_files: Vec<(String, ValidationState)>,
    /// Classes of the deployed build artifact.
    pub artifact: Option<Arc<dyn ClassProvider>>,
}

impl AppDeploy {
    pub fn new(app_id: impl Into<String>, device: impl Into<DeviceId>, api_level: u32) -> Self {
        Self {
            app_id: app_id.into(),
            device: device.into(),
            api_level,
            live_editable: true,
            seed_files: Vec::new(),
            artifact: None,
        }
    }

    pub fn with_seed(mut self, unit: impl Into<String>, tree: &SyntaxNode) -> Self {
        self.seed_files
            .push((unit.into(), ValidationState::capture(tree)));
        self
    }

    pub fn with_artifact(mut self, artifact: Arc<dyn ClassProvider>) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn live_editable(mut self, live_editable: bool) -> Self {
        self.live_editable = live_editable;
        self
    }
}

impl fmt::Debug for AppDeploy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppDeploy")
            .field("app_id", &self.app_id)
            .field("device", &self.device)
            .field("api_level", &self.api_level)
            .field("live_editable", &self.live_editable)
            .field("seed_files", &self.seed_files.len())
            .finish_non_exhaustive()
    }
}

impl LiveEditSession {
    /// Register a fresh deploy. Returns whether live edit tracks the device.
    ///
    /// A supported device starts `Loading` with a clean session: pending
    /// edits, errors, cache and snapshots are dropped and the snapshots are
    /// re-seeded from the deploy.
    pub fn notify_app_deploy(&mut self, deploy: AppDeploy) -> bool {
        let registry = self.registry();
        if !deploy.live_editable {
            crate::log!("session"; "{} is not live-editable on {}", deploy.app_id, deploy.device);
            registry.remove_device(&deploy.device);
            return false;
        }

        let info = DeviceInfo::new(&deploy.app_id, deploy.api_level);
        self.app_id = Some(deploy.app_id);

        if !self.device.supports(deploy.api_level) {
            crate::log!(
                "session";
                "{} runs API {}, live edit needs {}",
                deploy.device,
                deploy.api_level,
                self.device.min_api_level
            );
            registry.add_device(&deploy.device, DeviceStatus::UnsupportedVersion, info);
            return true;
        }

        registry.add_device(&deploy.device, DeviceStatus::Loading, info);
        registry.set_sync_needed(false);
        self.reset_state();

        for (unit, state) in deploy.seed_files {
            self.snapshots.insert(unit, Arc::new(state));
        }
        self.compiler
            .set_artifact(deploy.artifact.unwrap_or_else(|| Arc::new(EmptyProvider)));

        crate::debug!("session"; "deployed to {}, {} snapshots", deploy.device, self.snapshots.len());
        true
    }

    fn reset_state(&mut self) {
        self.queue.clear();
        self.buffer.clear();
        self.files_with_errors.clear();
        self.compiler.reset_state();
        self.snapshots.clear();
        self.cache.clear();
    }

    /// Changes were applied by a regular apply-changes refresh.
    pub fn notify_app_refresh(&self, device: &str) {
        self.registry.update(device, DeviceStatus::UpToDate);
    }

    /// A run started on `devices`. Returns whether other devices were excluded.
    pub fn notify_execution(&self, devices: &[DeviceId]) -> bool {
        let multi_deploy = self.registry.notify_execution(devices);
        if multi_deploy {
            crate::log!("session"; "live edit is limited to one device per run");
        }
        multi_deploy
    }

    pub fn device_disconnected(&self, device: &str) {
        if self.registry.remove_device(device) {
            crate::debug!("session"; "{device} disconnected");
        }
    }

    pub fn debugger_attached(&self, device: &str, attached: bool) {
        self.registry.set_debugger_attached(device, attached);
    }

    /// The build configuration changed; edits wait for a resync.
    pub fn sync_needed(&self) {
        self.registry.set_sync_needed(true);
    }

    /// Resync finished. Returns whether queued edits are ready to process.
    pub fn sync_complete(&self) -> bool {
        self.registry.set_sync_needed(false);
        self.has_pending()
    }

    /// Every device must be re-run before live edit resumes.
    pub fn request_rerun(&self) {
        self.registry
            .update_all(DeviceStatus::rerunnable(RERUN_MESSAGE, ErrorOrigin::Session));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::testing::FakeFrontEnd;
    use crate::config::EngineConfig;
    use crate::device::DisabledReason;
    use crate::ir::{ArtifactSnapshot, IrClass, IrMethod};
    use crate::session::{EditEvent, ProcessOutcome};
    use crate::syntax::NodeKind;
    use crate::transport::testing::FakeTransport;

    fn session() -> (Arc<FakeFrontEnd>, LiveEditSession) {
        let front_end = Arc::new(FakeFrontEnd::new());
        let session = LiveEditSession::new(
            front_end.clone(),
            Arc::new(FakeTransport::new()),
            &EngineConfig::default(),
        );
        (front_end, session)
    }

    #[test]
    fn test_deploy_registers_loading() {
        let (_, mut session) = session();
        assert!(session.notify_app_deploy(AppDeploy::new("app", "a", 34)));
        assert_eq!(session.registry().status("a"), DeviceStatus::Loading);
        assert_eq!(session.app_id(), Some("app"));

        session.notify_app_refresh("a");
        assert_eq!(session.registry().status("a"), DeviceStatus::UpToDate);
    }

    #[test]
    fn test_deploy_not_live_editable_clears_device() {
        let (_, mut session) = session();
        session.notify_app_deploy(AppDeploy::new("app", "a", 34));
        assert!(!session.notify_app_deploy(AppDeploy::new("app", "a", 34).live_editable(false)));
        assert_eq!(
            session.registry().status("a"),
            DeviceStatus::Disabled(DisabledReason::Unregistered)
        );
    }

    #[test]
    fn test_unsupported_api_blocks_every_device() {
        let (_, mut session) = session();
        session.notify_app_deploy(AppDeploy::new("app", "new", 34));
        session.notify_app_deploy(AppDeploy::new("app", "old", 29));
        assert_eq!(session.registry().status("old"), DeviceStatus::UnsupportedVersion);

        assert!(!session.file_changed(EditEvent::new("Main.kt")));
        assert_eq!(
            session.registry().status("new"),
            DeviceStatus::UnsupportedVersionOtherDevice
        );
        assert_eq!(session.registry().status("old"), DeviceStatus::UnsupportedVersion);
    }

    #[test]
    fn test_redeploy_resets_session() {
        let (front_end, mut session) = session();
        let class = IrClass::new("a/Main").with_method(IrMethod::new("run", "()V", "1"));
        front_end.set("Main.kt", vec![class.clone()]);

        session.notify_app_deploy(AppDeploy::new("app", "a", 34));
        session.notify_app_refresh("a");
        session.file_changed(EditEvent::new("Main.kt"));
        session.process_pending();
        assert_eq!(session.cache().len(), 1);

        let tree = SyntaxNode::new(NodeKind::File);
        session.notify_app_deploy(
            AppDeploy::new("app", "a", 34)
                .with_seed("Main.kt", &tree)
                .with_artifact(Arc::new(ArtifactSnapshot::new([class]))),
        );
        assert!(session.cache().is_empty());
        assert!(session.snapshot("Main.kt").is_some());
        assert!(!session.has_pending());
    }

    #[test]
    fn test_sync_needed_holds_edits() {
        let (front_end, mut session) = session();
        front_end.set("Main.kt", vec![IrClass::new("a/Main")]);
        session.notify_app_deploy(AppDeploy::new("app", "a", 34));
        session.notify_app_refresh("a");

        session.sync_needed();
        assert!(!session.file_changed(EditEvent::new("Main.kt")));
        assert_eq!(session.registry().status("a"), DeviceStatus::SyncNeeded);

        assert!(session.sync_complete());
        assert!(matches!(session.process_pending(), ProcessOutcome::Pushed { .. }));
        assert_eq!(session.registry().status("a"), DeviceStatus::UpToDate);
    }

    #[test]
    fn test_request_rerun() {
        let (_, mut session) = session();
        session.notify_app_deploy(AppDeploy::new("app", "a", 34));
        session.notify_app_deploy(AppDeploy::new("app", "b", 34));

        session.request_rerun();
        let snapshot = session.registry().snapshot();
        assert!(snapshot.values().all(DeviceStatus::is_unrecoverable));
        assert!(!session.should_live_edit());
    }

    #[test]
    fn test_execution_and_debugger() {
        let (_, mut session) = session();
        session.notify_app_deploy(AppDeploy::new("app", "a", 34));
        session.notify_app_deploy(AppDeploy::new("app", "b", 34));
        session.notify_app_refresh("b");

        assert!(session.notify_execution(&["a".into()]));
        assert_eq!(session.registry().status("b"), DeviceStatus::NoMultiDeploy);

        session.debugger_attached("a", true);
        assert_eq!(session.registry().status("a"), DeviceStatus::DebuggerAttached);

        session.device_disconnected("a");
        assert_eq!(
            session.registry().status("a"),
            DeviceStatus::Disabled(DisabledReason::Unregistered)
        );
    }
}
