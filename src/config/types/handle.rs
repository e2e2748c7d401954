//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement, so
//! the edit worker picks up `liveedit.toml` changes on its next batch.

use crate::config::EngineConfig;
use anyhow::Result;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<EngineConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(EngineConfig::default()));

/// Hash of the loaded config file content.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn cfg() -> Arc<EngineConfig> {
    CONFIG.load_full()
}

/// Reload config from disk if content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged or
/// no config file was loaded.
pub fn reload_config() -> Result<bool> {
    let current = cfg();
    let Some(path) = current.config_path.as_deref() else {
        return Ok(false);
    };

    let content = std::fs::read_to_string(path)?;
    let new_hash = content_hash(&content);
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let new_config = EngineConfig::load(Some(path))?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);
    Ok(true)
}

#[inline]
pub fn init_config(config: EngineConfig) -> Arc<EngineConfig> {
    if let Some(path) = &config.config_path
        && let Ok(content) = std::fs::read_to_string(path)
    {
        CONFIG_HASH.store(content_hash(&content), Ordering::Relaxed);
    }

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

fn content_hash(content: &str) -> u64 {
    let digest = blake3::hash(content.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("[device]"), content_hash("[device]"));
        assert_ne!(content_hash("[device]"), content_hash("[session]"));
    }
}
