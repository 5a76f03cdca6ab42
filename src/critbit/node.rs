//! Node types and index encoding for the crit-bit tree.
//!
//! ## Arena Layout
//!
//! Nodes live in two contiguous vectors owned by the tree, one for inner
//! nodes and one for outer nodes (leaves). Links between nodes are plain
//! `u64` indices, never references.
//!
//! ## Child References
//!
//! A child field must say which vector it points into. Bit 63 (`NODE_TYPE`)
//! is the tag:
//!
//! ```text
//! 0xxx...x  -> inner node at index x
//! 1xxx...x  -> outer node at index x
//! 1111...1  -> ROOT sentinel ("no parent")
//! ```
//!
//! Parent fields only ever point at inner nodes, so they are stored
//! untagged, with `ROOT` for the root node. The tag bit caps capacity at
//! `2^63 - 1` outer nodes, which keeps every real index below `ROOT`.

/// Bit position of the node-type tag in a child reference.
pub const NODE_TYPE: u8 = 63;

/// Tag bit set for references to outer nodes.
pub const OUT: u64 = 1 << NODE_TYPE;

/// Parent sentinel for the root node.
pub const ROOT: u64 = u64::MAX;

/// Most significant bit of a `u128` key.
pub const MSB_U128: u8 = 127;

/// Largest number of outer nodes the encoding supports.
pub const MAX_LEN: u64 = u64::MAX ^ OUT;

/// Branch node, splitting its subtree on `critical_bit`.
///
/// Every key in the left subtree has `critical_bit` clear, every key in the
/// right subtree has it set, and all keys below agree on every higher bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerNode {
    /// Bit index, 0 (LSB) to 127 (MSB)
    pub critical_bit: u8,

    /// Parent inner node index, `ROOT` if this is the root
    pub parent: u64,

    /// Child reference for the clear-bit side
    pub left: u64,

    /// Child reference for the set-bit side
    pub right: u64,
}

impl InnerNode {
    /// Child reference on the side `key` falls to.
    #[inline]
    pub fn child_for(&self, key: u128) -> u64 {
        if is_set(key, self.critical_bit) {
            self.right
        } else {
            self.left
        }
    }

    /// Replace whichever child currently equals `old` with `new`.
    #[inline]
    pub fn replace_child(&mut self, old: u64, new: u64) {
        if self.left == old {
            self.left = new;
        } else {
            self.right = new;
        }
    }
}

/// Leaf node holding a key and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterNode<V> {
    pub key: u128,
    pub value: V,

    /// Parent inner node index, `ROOT` if this is the only node
    pub parent: u64,
}

// ============================================================================
// Index encoding
// ============================================================================

/// Whether a child reference points at an outer node.
#[inline]
pub fn is_outer(child: u64) -> bool {
    child & OUT == OUT
}

/// Tag an outer vector index as a child reference.
#[inline]
pub fn outer_ref(index: u64) -> u64 {
    index | OUT
}

/// Vector index of a tagged outer child reference.
#[inline]
pub fn outer_index(child: u64) -> usize {
    (child ^ OUT) as usize
}

// ============================================================================
// Bit helpers
// ============================================================================

/// Whether bit `bit` of `key` is set.
#[inline]
pub fn is_set(key: u128, bit: u8) -> bool {
    (key >> bit) & 1 == 1
}

/// Highest bit at which two distinct keys differ.
///
/// Callers guarantee `a != b`.
#[inline]
pub fn crit_bit(a: u128, b: u128) -> u8 {
    debug_assert_ne!(a, b, "crit bit of equal keys");
    MSB_U128 - (a ^ b).leading_zeros() as u8
}

// ============================================================================
// Unit Tests
// ============================================================================
