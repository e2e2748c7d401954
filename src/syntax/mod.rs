//! Declaration syntax trees and trivia-insensitive text comparison.

mod normalize;
mod tree;

pub use normalize::{differs, normalize};
pub use tree::{NodeKind, SyntaxNode, Walk};
