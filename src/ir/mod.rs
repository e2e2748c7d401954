//! Compiled-class intermediate representation.
//!
//! | Module     | Purpose                                         |
//! |------------|-------------------------------------------------|
//! | `class`    | `IrClass`, fields, methods, slots               |
//! | `hash`     | blake3 body hashes                              |
//! | `cache`    | `IrClassCache` (last-known-good classes)        |
//! | `provider` | Baseline lookup (cache, deployed artifact)      |
//! | `support`  | Support-class classification policy             |

mod cache;
mod class;
mod hash;
mod provider;
pub mod support;

pub use cache::IrClassCache;
pub use class::{
    CONSTRUCTOR, GroupId, IrClass, IrField, IrMethod, MethodFlags, MethodSlot, STATIC_INITIALIZER,
};
pub use hash::BodyHash;
pub use provider::{ArtifactSnapshot, Baseline, ClassProvider, EmptyProvider};
pub use support::{SupportKind, classify, is_support_class};
