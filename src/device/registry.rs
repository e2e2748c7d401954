//! Device Status State Machine.
//!
//! Last-writer-wins map from device to status, shared between the edit
//! worker and the runtime-error poller. Every mutation runs under the lock,
//! takes a snapshot, releases the lock and only then calls listeners, so a
//! listener may read or update the registry again.
//!
//! The reported status layers two flags over the stored one:
//!
//! ```text
//! sync needed ──> SyncNeeded
//!      │no
//! debugger   ──> DebuggerAttached
//!      │no
//! stored status (unknown device: Disabled)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::status::{DeviceStatus, DisabledReason};
use crate::transport::DeviceId;

/// Reported status of every registered device.
pub type StatusSnapshot = BTreeMap<DeviceId, DeviceStatus>;

pub type StatusListener = Arc<dyn Fn(&StatusSnapshot) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub api_level: u32,
    pub app_id: String,
}

impl DeviceInfo {
    pub fn new(app_id: impl Into<String>, api_level: u32) -> Self {
        Self {
            api_level,
            app_id: app_id.into(),
        }
    }
}

#[derive(Debug)]
struct DeviceEntry {
    status: DeviceStatus,
    info: DeviceInfo,
    debugger: bool,
    /// Status recorded when the device was excluded from a multi-device run.
    before_exclusion: Option<DeviceStatus>,
}

impl DeviceEntry {
    fn reported(&self, sync_needed: bool) -> DeviceStatus {
        if sync_needed {
            DeviceStatus::SyncNeeded
        } else if self.debugger {
            DeviceStatus::DebuggerAttached
        } else {
            self.status.clone()
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    devices: BTreeMap<DeviceId, DeviceEntry>,
    sync_needed: bool,
}

impl RegistryState {
    fn snapshot(&self) -> StatusSnapshot {
        self.devices
            .iter()
            .map(|(id, entry)| (id.clone(), entry.reported(self.sync_needed)))
            .collect()
    }
}

#[derive(Default)]
pub struct DeviceRegistry {
    state: Mutex<RegistryState>,
    listeners: Mutex<Vec<StatusListener>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: impl Fn(&StatusSnapshot) + Send + Sync + 'static) {
        self.listeners.lock().push(Arc::new(listener));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Reported status; unregistered devices are `Disabled`.
    pub fn status(&self, device: &str) -> DeviceStatus {
        let state = self.state.lock();
        state
            .devices
            .get(device)
            .map(|entry| entry.reported(state.sync_needed))
            .unwrap_or(DeviceStatus::Disabled(DisabledReason::Unregistered))
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.lock().snapshot()
    }

    pub fn devices(&self) -> Vec<DeviceId> {
        self.state.lock().devices.keys().cloned().collect()
    }

    pub fn info(&self, device: &str) -> Option<DeviceInfo> {
        self.state.lock().devices.get(device).map(|e| e.info.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().devices.is_empty()
    }

    /// Devices patches are pushed to. A paused debugger skips the device.
    pub fn editable_devices(&self) -> Vec<DeviceId> {
        self.state
            .lock()
            .devices
            .iter()
            .filter(|(_, entry)| entry.status.is_editable() && !entry.debugger)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn has_unsupported_api(&self) -> bool {
        self.state
            .lock()
            .devices
            .values()
            .any(|e| e.status == DeviceStatus::UnsupportedVersion)
    }

    /// Any device needs a redeploy.
    pub fn is_unrecoverable(&self) -> bool {
        self.state
            .lock()
            .devices
            .values()
            .any(|e| e.status.is_unrecoverable())
    }

    /// No device can receive patches.
    pub fn is_disabled(&self) -> bool {
        self.state
            .lock()
            .devices
            .values()
            .all(|e| e.status.is_disabled())
    }

    pub fn is_sync_needed(&self) -> bool {
        self.state.lock().sync_needed
    }

    // =========================================================================
    // Updates (each one notifies listeners)
    // =========================================================================

    /// Register (or re-register) a device.
    pub fn add_device(&self, device: &str, status: DeviceStatus, info: DeviceInfo) {
        self.mutate(|state| {
            state.devices.insert(
                device.to_string(),
                DeviceEntry {
                    status,
                    info,
                    debugger: false,
                    before_exclusion: None,
                },
            );
        });
    }

    pub fn remove_device(&self, device: &str) -> bool {
        self.mutate(|state| state.devices.remove(device).is_some())
    }

    pub fn clear(&self) {
        self.mutate(|state| state.devices.clear());
    }

    /// Set the stored status of one device; unknown devices are ignored.
    pub fn update(&self, device: &str, status: DeviceStatus) {
        self.mutate(|state| {
            if let Some(entry) = state.devices.get_mut(device) {
                entry.status = status;
            }
        });
    }

    pub fn update_all(&self, status: DeviceStatus) {
        self.update_with(|_, _| status.clone());
    }

    /// Atomically map every stored status.
    pub fn update_with(&self, mut f: impl FnMut(&str, &DeviceStatus) -> DeviceStatus) {
        self.mutate(|state| {
            for (id, entry) in state.devices.iter_mut() {
                entry.status = f(id, &entry.status);
            }
        });
    }

    /// Broad update that keeps unrecoverable, disabled and excluded devices.
    pub fn update_editable(&self, status: DeviceStatus) {
        self.update_with(|_, prev| {
            if prev.is_sticky() {
                prev.clone()
            } else {
                status.clone()
            }
        });
    }

    /// Same rule as [`update_editable`](Self::update_editable) for one device.
    pub fn update_editable_device(&self, device: &str, status: DeviceStatus) {
        self.mutate(|state| {
            if let Some(entry) = state.devices.get_mut(device)
                && !entry.status.is_sticky()
            {
                entry.status = status;
            }
        });
    }

    /// A run started on `targets`. Returns whether other devices were excluded.
    ///
    /// - excluded target: `Disabled` until its deploy arrives, recorded
    ///   status kept
    /// - any other target: unchanged
    /// - non-target disabled by an earlier run: recorded status restored
    /// - non-target otherwise disabled: unchanged
    /// - any other non-target: status recorded, then `NoMultiDeploy`
    pub fn notify_execution(&self, targets: &[DeviceId]) -> bool {
        let targets: BTreeSet<&str> = targets.iter().map(String::as_str).collect();

        self.mutate(|state| {
            let mut multi_deploy = false;
            for (id, entry) in state.devices.iter_mut() {
                if targets.contains(id.as_str()) {
                    if entry.status == DeviceStatus::NoMultiDeploy {
                        entry.status = DeviceStatus::Disabled(DisabledReason::PendingDeploy);
                    } else {
                        entry.before_exclusion = None;
                    }
                } else if entry.status.is_disabled() {
                    if let Some(prior) = entry.before_exclusion.take() {
                        entry.status = prior;
                    }
                } else {
                    if entry.status != DeviceStatus::NoMultiDeploy {
                        entry.before_exclusion = Some(entry.status.clone());
                        entry.status = DeviceStatus::NoMultiDeploy;
                    }
                    multi_deploy = true;
                }
            }
            multi_deploy
        })
    }

    /// Resync required (`true`) or completed (`false`).
    pub fn set_sync_needed(&self, needed: bool) {
        self.mutate(|state| state.sync_needed = needed);
    }

    pub fn set_debugger_attached(&self, device: &str, attached: bool) {
        self.mutate(|state| {
            if let Some(entry) = state.devices.get_mut(device) {
                entry.debugger = attached;
            }
        });
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, state.snapshot())
        };

        crate::debug!("device"; "{}", describe(&snapshot));
        let listeners: Vec<StatusListener> = self.listeners.lock().clone();
        for listener in listeners {
            listener(&snapshot);
        }
        result
    }
}

fn describe(snapshot: &StatusSnapshot) -> String {
    snapshot
        .iter()
        .map(|(id, status)| format!("{id}={status}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::device::ErrorOrigin;

    fn registry(devices: &[(&str, DeviceStatus)]) -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        for (id, status) in devices {
            registry.add_device(id, status.clone(), DeviceInfo::new("app", 34));
        }
        registry
    }

    #[test]
    fn test_unknown_device_is_disabled() {
        let registry = DeviceRegistry::new();
        assert_eq!(
            registry.status("emulator-5554"),
            DeviceStatus::Disabled(DisabledReason::Unregistered)
        );
        assert!(registry.is_disabled());
    }

    #[test]
    fn test_every_update_notifies() {
        let registry = registry(&[("a", DeviceStatus::UpToDate)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.update("a", DeviceStatus::UpToDate);
        registry.update("a", DeviceStatus::UpToDate);
        registry.update("missing", DeviceStatus::OutOfDate);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_listener_can_reenter() {
        let registry = Arc::new(registry(&[("a", DeviceStatus::Loading)]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (inner, log) = (Arc::downgrade(&registry), seen.clone());
        registry.add_listener(move |snapshot| {
            // Reading from a listener must not deadlock
            if let Some(registry) = inner.upgrade() {
                log.lock().push(registry.status("a"));
            }
            assert_eq!(snapshot.len(), 1);
        });

        registry.update("a", DeviceStatus::UpToDate);
        assert_eq!(seen.lock().as_slice(), &[DeviceStatus::UpToDate]);
    }

    #[test]
    fn test_multi_device_exclusivity() {
        let registry = registry(&[("a", DeviceStatus::OutOfDate), ("b", DeviceStatus::UpToDate)]);

        assert!(registry.notify_execution(&["a".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::OutOfDate);
        assert_eq!(registry.status("b"), DeviceStatus::NoMultiDeploy);

        // Back on b: b waits for its deploy, a is excluded
        assert!(registry.notify_execution(&["b".into()]));
        assert_eq!(registry.status("b"), DeviceStatus::Disabled(DisabledReason::PendingDeploy));
        assert_eq!(registry.status("a"), DeviceStatus::NoMultiDeploy);

        // Back on a: b gets its recorded status again
        assert!(!registry.notify_execution(&["a".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::Disabled(DisabledReason::PendingDeploy));
        assert_eq!(registry.status("b"), DeviceStatus::UpToDate);
    }

    #[test]
    fn test_execution_on_all_devices() {
        let registry = registry(&[("a", DeviceStatus::UpToDate), ("b", DeviceStatus::UpToDate)]);
        assert!(!registry.notify_execution(&["a".into(), "b".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::UpToDate);
        assert_eq!(registry.status("b"), DeviceStatus::UpToDate);
    }

    #[test]
    fn test_device_recovers_status_after_exclusion() {
        let registry = registry(&[("a", DeviceStatus::UpToDate), ("b", DeviceStatus::UpToDate)]);
        assert!(!registry.notify_execution(&["a".into(), "b".into()]));

        assert!(registry.notify_execution(&["b".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::NoMultiDeploy);

        assert!(!registry.notify_execution(&["a".into(), "b".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::Disabled(DisabledReason::PendingDeploy));

        assert!(!registry.notify_execution(&["b".into()]));
        assert_eq!(registry.status("a"), DeviceStatus::UpToDate);
        assert_eq!(registry.status("b"), DeviceStatus::UpToDate);
    }

    #[test]
    fn test_debugger_attached_devices_are_not_patched() {
        let registry = registry(&[("a", DeviceStatus::UpToDate), ("b", DeviceStatus::UpToDate)]);
        registry.set_debugger_attached("a", true);
        assert_eq!(registry.editable_devices(), vec!["b".to_string()]);

        registry.set_debugger_attached("a", false);
        assert_eq!(registry.editable_devices().len(), 2);
    }

    #[test]
    fn test_sync_needed_takes_priority() {
        let registry = registry(&[("a", DeviceStatus::UpToDate)]);
        registry.set_debugger_attached("a", true);
        assert_eq!(registry.status("a"), DeviceStatus::DebuggerAttached);

        registry.set_sync_needed(true);
        registry.update("a", DeviceStatus::paused("x"));
        assert_eq!(registry.status("a"), DeviceStatus::SyncNeeded);

        registry.set_sync_needed(false);
        registry.set_debugger_attached("a", false);
        assert_eq!(registry.status("a"), DeviceStatus::paused("x"));
    }

    #[test]
    fn test_editable_update_keeps_sticky_statuses() {
        let fatal = DeviceStatus::rerunnable("added a field", ErrorOrigin::Compile);
        let registry = registry(&[
            ("paused", DeviceStatus::paused("x")),
            ("fatal", fatal.clone()),
            ("excluded", DeviceStatus::NoMultiDeploy),
            ("off", DeviceStatus::Disabled(DisabledReason::PendingDeploy)),
        ]);

        registry.update_editable(DeviceStatus::InProgress);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot["paused"], DeviceStatus::InProgress);
        assert_eq!(snapshot["fatal"], fatal);
        assert_eq!(snapshot["excluded"], DeviceStatus::NoMultiDeploy);
        assert!(snapshot["off"].is_disabled());

        registry.update_editable_device("fatal", DeviceStatus::UpToDate);
        assert_eq!(registry.status("fatal"), fatal);
        assert!(registry.is_unrecoverable());
    }

    #[test]
    fn test_editable_devices_and_removal() {
        let registry = registry(&[
            ("a", DeviceStatus::UpToDate),
            ("b", DeviceStatus::NoMultiDeploy),
            ("c", DeviceStatus::UnsupportedVersion),
        ]);
        assert_eq!(registry.editable_devices(), vec!["a".to_string(), "c".to_string()]);
        assert!(registry.has_unsupported_api());

        assert!(registry.remove_device("c"));
        assert!(!registry.remove_device("c"));
        assert!(!registry.has_unsupported_api());
        assert_eq!(registry.info("a").unwrap().api_level, 34);
    }
}
