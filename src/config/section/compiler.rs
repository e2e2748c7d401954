//! `[compiler]` section configuration.
//!
//! ```toml
//! [compiler]
//! cross_module = true            # one front-end call for all modules
//! ship_all_on_first_edit = true  # first compile ships every touched class
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compile units of several modules in one front-end call when the
    /// front end allows it.
    pub cross_module: bool,

    pub ship_all_on_first_edit: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cross_module: true,
            ship_all_on_first_edit: true,
        }
    }
}
