//! Result of one compilation request.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ir::{GroupId, IrClass, MethodSlot};

/// How the runtime must invalidate state after applying a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidateMode {
    /// Re-run only the touched recomposable scopes.
    #[default]
    RestartGroups,
    /// Discard all cached state.
    ResetState,
}

/// Classes to ship plus what the runtime must re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEditCompilerOutput {
    /// Ordinary classes that must be shipped.
    pub classes: BTreeMap<String, IrClass>,
    /// Support classes, always shipped whole.
    pub support_classes: BTreeMap<String, IrClass>,
    /// Recomposable scopes touched by the edit.
    pub group_ids: BTreeSet<GroupId>,
    /// An edit happened outside any recomposable scope.
    pub reset_state: bool,
    /// Redefined method slots per class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub redefined: BTreeMap<String, Vec<MethodSlot>>,
}

impl LiveEditCompilerOutput {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.support_classes.is_empty()
    }

    /// Number of shipped classes of both kinds.
    pub fn class_count(&self) -> usize {
        self.classes.len() + self.support_classes.len()
    }

    pub fn invalidate_mode(&self) -> InvalidateMode {
        if self.reset_state {
            InvalidateMode::ResetState
        } else {
            InvalidateMode::RestartGroups
        }
    }

    /// Every shipped class, ordinary classes first.
    pub fn all_classes(&self) -> impl Iterator<Item = &IrClass> {
        self.classes.values().chain(self.support_classes.values())
    }
}

/// Outcome of a compilation request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled(LiveEditCompilerOutput),
    /// The front end cancelled cooperatively; retry later.
    Cancelled,
}

impl CompileOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The output, or an empty one when cancelled.
    pub fn into_output(self) -> LiveEditCompilerOutput {
        match self {
            Self::Compiled(output) => output,
            Self::Cancelled => LiveEditCompilerOutput::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_empty() {
        let output = CompileOutcome::Cancelled.into_output();
        assert!(output.is_empty());
        assert_eq!(output.invalidate_mode(), InvalidateMode::RestartGroups);
    }

    #[test]
    fn test_counts_and_mode() {
        let mut output = LiveEditCompilerOutput::default();
        output.classes.insert("a/B".into(), IrClass::new("a/B"));
        output
            .support_classes
            .insert("a/B$f$1".into(), IrClass::new("a/B$f$1"));
        output.reset_state = true;

        assert_eq!(output.class_count(), 2);
        assert_eq!(output.all_classes().next().unwrap().name, "a/B");
        assert_eq!(output.invalidate_mode(), InvalidateMode::ResetState);
    }
}
