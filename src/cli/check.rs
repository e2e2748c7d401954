//! Edit check command.
//!
//! Runs the structural validator on two syntax trees of one source unit.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::logger::{status_error, status_success};
use crate::syntax::SyntaxNode;
use crate::validate::validate_trees;

/// Validate the edit `before` -> `after`. Fails when it cannot be hot-swapped.
pub fn check_edit(before: &Path, after: &Path) -> Result<()> {
    let errors = validate_trees(&read_tree(before)?, &read_tree(after)?);
    crate::debug!("check"; "{} error(s)", errors.len());
    if errors.is_empty() {
        status_success("edit can be applied live");
        return Ok(());
    }

    let detail = errors
        .iter()
        .map(|e| format!("{}: {e}", e.kind.code()))
        .collect::<Vec<_>>()
        .join("\n");
    status_error("edit needs a redeploy", &detail);
    bail!("{} unsupported change(s)", errors.len())
}

fn read_tree(path: &Path) -> Result<SyntaxNode> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid syntax tree in {}", path.display()))
}
