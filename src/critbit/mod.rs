//! Crit-bit tree: an ordered map over `u128` keys.
//!
//! The book keeps one tree per side, keyed by order id. The tree supports:
//!
//! - Insert / pop / exact lookup in O(log n) (depth bounded by 128)
//! - Min / max lookups
//! - Cursor traversal in either direction, with a fused step-and-pop
//!   used by matching
//!
//! Nodes are kept in two vectors and linked by index (see [`node`]), so the
//! whole tree is two contiguous allocations and clones cheaply.

pub mod node;
mod traverse;
mod tree;

pub use traverse::{Cursor, Direction, Iter};
pub use tree::CritBitTree;
