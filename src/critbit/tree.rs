//! Crit-bit tree over `u128` keys.
//!
//! ## Structure
//!
//! ```text
//!              inner[0] (bit 65)
//!             /                \
//!      inner[2] (bit 3)      outer[1]
//!       /          \
//!  outer[0]     outer[2]
//! ```
//!
//! Each inner node branches on the highest bit at which the keys below it
//! differ. Critical bits strictly decrease on the way down, so an in-order
//! walk yields keys in ascending numeric order.
//!
//! ## Removal
//!
//! Removing a leaf also removes its parent inner node. Both are deleted
//! from their vectors by swap-remove: the last element moves into the gap
//! and its single set of back references is rewritten. See
//! [`CritBitTree::swap_remove_inner`] and [`CritBitTree::swap_remove_outer`].

use crate::critbit::node::{
    crit_bit, is_outer, is_set, outer_index, outer_ref, InnerNode, OuterNode, MAX_LEN, ROOT,
};
use crate::error::{TreeError, TreeResult};

/// Outer node reached by walking down from the root following a key.
#[derive(Debug, Clone, Copy)]
struct Closest {
    /// Tagged reference to the outer node
    child: u64,

    /// Its parent inner node
    parent: u64,
}

/// Ordered map from `u128` keys to values, stored as an index arena.
#[derive(Debug, Clone)]
pub struct CritBitTree<V> {
    /// Child reference of the root; meaningless while empty
    pub(super) root: u64,

    pub(super) inner: Vec<InnerNode>,

    pub(super) outer: Vec<OuterNode<V>>,
}

impl<V> Default for CritBitTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CritBitTree<V> {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            root: 0,
            inner: Vec::new(),
            outer: Vec::new(),
        }
    }

    /// Alias of [`CritBitTree::new`]
    pub fn empty() -> Self {
        Self::new()
    }

    /// Create an empty tree with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            root: 0,
            inner: Vec::with_capacity(capacity.saturating_sub(1)),
            outer: Vec::with_capacity(capacity),
        }
    }

    /// Create a tree holding a single key
    pub fn singleton(key: u128, value: V) -> Self {
        let mut tree = Self::with_capacity(1);
        tree.insert_empty(key, value);
        tree
    }

    /// Consume an empty tree.
    ///
    /// Fails with [`TreeError::NotEmpty`] if any key remains, since values
    /// would otherwise be dropped silently.
    pub fn destroy_empty(self) -> TreeResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TreeError::NotEmpty)
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Number of keys (outer nodes)
    #[inline]
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Whether `key` is present
    pub fn has_key(&self, key: u128) -> bool {
        !self.is_empty() && self.outer[self.closest(key).index()].key == key
    }

    /// Borrow the value stored under `key`
    pub fn borrow(&self, key: u128) -> TreeResult<&V> {
        let index = self.find(key)?;
        Ok(&self.outer[index].value)
    }

    /// Mutably borrow the value stored under `key`
    pub fn borrow_mut(&mut self, key: u128) -> TreeResult<&mut V> {
        let index = self.find(key)?;
        Ok(&mut self.outer[index].value)
    }

    /// Smallest key in the tree
    pub fn min_key(&self) -> TreeResult<u128> {
        self.edge_key(false)
    }

    /// Largest key in the tree
    pub fn max_key(&self) -> TreeResult<u128> {
        self.edge_key(true)
    }

    fn edge_key(&self, rightmost: bool) -> TreeResult<u128> {
        if self.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        let child = self.descend(self.root, rightmost);
        Ok(self.outer[outer_index(child)].key)
    }

    /// Follow one side from `child` down to an outer node
    pub(super) fn descend(&self, mut child: u64, rightmost: bool) -> u64 {
        while !is_outer(child) {
            let node = &self.inner[child as usize];
            child = if rightmost { node.right } else { node.left };
        }
        child
    }

    /// Outer vector index holding `key`, checking emptiness first
    fn find(&self, key: u128) -> TreeResult<usize> {
        if self.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        let index = self.closest(key).index();
        if self.outer[index].key != key {
            return Err(TreeError::KeyNotFound(key));
        }
        Ok(index)
    }

    /// Walk down from the root following the bits of `key`.
    ///
    /// The tree must be non-empty. The returned outer node is the only one
    /// that can equal `key`; for any other key it shares the longest prefix
    /// among the critical bits on the path.
    fn closest(&self, key: u128) -> Closest {
        let mut parent = ROOT;
        let mut child = self.root;
        while !is_outer(child) {
            parent = child;
            child = self.inner[child as usize].child_for(key);
        }
        Closest { child, parent }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert `key` with `value`.
    ///
    /// Fails with [`TreeError::DuplicateKey`] rather than overwriting, and
    /// with [`TreeError::TreeFull`] once the index encoding is exhausted.
    pub fn insert(&mut self, key: u128, value: V) -> TreeResult<()> {
        match self.outer.len() {
            0 => {
                self.insert_empty(key, value);
                Ok(())
            }
            1 => self.insert_singleton(key, value),
            n if n as u64 >= MAX_LEN => Err(TreeError::TreeFull),
            _ => self.insert_general(key, value),
        }
    }

    fn insert_empty(&mut self, key: u128, value: V) {
        self.outer.push(OuterNode {
            key,
            value,
            parent: ROOT,
        });
        self.root = outer_ref(0);
    }

    fn insert_singleton(&mut self, key: u128, value: V) -> TreeResult<()> {
        let existing = self.outer[0].key;
        if existing == key {
            return Err(TreeError::DuplicateKey(key));
        }

        let bit = crit_bit(existing, key);
        self.push_insert_nodes(key, value, bit, ROOT, outer_ref(0));
        self.outer[0].parent = 0;
        self.root = 0;
        Ok(())
    }

    fn insert_general(&mut self, key: u128, value: V) -> TreeResult<()> {
        let closest = self.closest(key);
        let closest_key = self.outer[closest.index()].key;
        if closest_key == key {
            return Err(TreeError::DuplicateKey(key));
        }

        let bit = crit_bit(closest_key, key);
        let new_inner = self.inner.len() as u64;

        if bit < self.inner[closest.parent as usize].critical_bit {
            // Splice between the closest leaf and its parent
            self.inner[closest.parent as usize].replace_child(closest.child, new_inner);
            self.outer[closest.index()].parent = new_inner;
            self.push_insert_nodes(key, value, bit, closest.parent, closest.child);
            return Ok(());
        }

        // Walk up until an ancestor splits on a higher bit than the new one
        let mut node = self.inner[closest.parent as usize].parent;
        loop {
            if node == ROOT {
                let old_root = self.root;
                self.inner[old_root as usize].parent = new_inner;
                self.root = new_inner;
                self.push_insert_nodes(key, value, bit, ROOT, old_root);
                return Ok(());
            }

            let ancestor = self.inner[node as usize];
            if bit < ancestor.critical_bit {
                // Child on the key's side is the inner node just walked from
                let displaced = ancestor.child_for(key);
                self.inner[node as usize].replace_child(displaced, new_inner);
                self.inner[displaced as usize].parent = new_inner;
                self.push_insert_nodes(key, value, bit, node, displaced);
                return Ok(());
            }
            node = ancestor.parent;
        }
    }

    /// Append the new outer node and the inner node that joins it with
    /// `sibling`. Links from existing nodes must already point at the next
    /// inner index.
    fn push_insert_nodes(
        &mut self,
        key: u128,
        value: V,
        critical_bit: u8,
        parent: u64,
        sibling: u64,
    ) {
        let new_outer = outer_ref(self.outer.len() as u64);
        let new_inner = self.inner.len() as u64;

        let (left, right) = if is_set(key, critical_bit) {
            (sibling, new_outer)
        } else {
            (new_outer, sibling)
        };

        self.outer.push(OuterNode {
            key,
            value,
            parent: new_inner,
        });
        self.inner.push(InnerNode {
            critical_bit,
            parent,
            left,
            right,
        });
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove `key` and return its value
    pub fn pop(&mut self, key: u128) -> TreeResult<V> {
        let index = self.find(key)?;
        Ok(self.remove_outer(outer_ref(index as u64)))
    }

    /// Remove the outer node at tagged reference `child`.
    pub(super) fn remove_outer(&mut self, child: u64) -> V {
        if self.outer.len() == 1 {
            self.root = 0;
            return self.swap_remove_outer(0).value;
        }

        let index = outer_index(child);
        let parent = self.outer[index].parent;
        self.splice_out(child, parent);
        self.swap_remove_inner(parent as usize);
        self.swap_remove_outer(index).value
    }

    /// Replace inner node `parent` by the sibling of `child`.
    ///
    /// Afterwards nothing refers to `parent` or `child`.
    fn splice_out(&mut self, child: u64, parent: u64) {
        let node = self.inner[parent as usize];
        let sibling = if node.left == child {
            node.right
        } else {
            node.left
        };

        self.set_parent(sibling, node.parent);
        if node.parent == ROOT {
            self.root = sibling;
        } else {
            self.inner[node.parent as usize].replace_child(parent, sibling);
        }
    }

    fn set_parent(&mut self, child: u64, parent: u64) {
        if is_outer(child) {
            self.outer[outer_index(child)].parent = parent;
        } else {
            self.inner[child as usize].parent = parent;
        }
    }

    /// Swap-remove the inner node at `index`, which must already be
    /// unlinked from the tree.
    ///
    /// The node moved into `index` gets its children and its parent (or
    /// the root) pointed at the new position.
    pub(super) fn swap_remove_inner(&mut self, index: usize) -> InnerNode {
        let last = self.inner.len() - 1;
        let removed = self.inner.swap_remove(index);
        if index == last {
            return removed;
        }

        let moved = self.inner[index];
        let new_ref = index as u64;
        self.set_parent(moved.left, new_ref);
        self.set_parent(moved.right, new_ref);
        if moved.parent == ROOT {
            self.root = new_ref;
        } else {
            self.inner[moved.parent as usize].replace_child(last as u64, new_ref);
        }
        removed
    }

    /// Swap-remove the outer node at `index`, which must already be
    /// unlinked from the tree.
    pub(super) fn swap_remove_outer(&mut self, index: usize) -> OuterNode<V> {
        let last = self.outer.len() - 1;
        let removed = self.outer.swap_remove(index);
        if index == last {
            return removed;
        }

        let parent = self.outer[index].parent;
        let new_ref = outer_ref(index as u64);
        if parent == ROOT {
            self.root = new_ref;
        } else {
            self.inner[parent as usize].replace_child(outer_ref(last as u64), new_ref);
        }
        removed
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check every structural invariant of the arena.
    ///
    /// Used by tests; walks every leaf up to the root, so it is
    /// `O(n log n)`.
    pub fn is_well_formed(&self) -> bool {
        let n_outer = self.outer.len();
        let n_inner = self.inner.len();

        match n_outer {
            0 => return n_inner == 0 && self.root == 0,
            1 => {
                return n_inner == 0
                    && self.root == outer_ref(0)
                    && self.outer[0].parent == ROOT
            }
            _ => {}
        }

        if n_outer != n_inner + 1 || is_outer(self.root) {
            return false;
        }
        if self.root as usize >= n_inner || self.inner[self.root as usize].parent != ROOT {
            return false;
        }

        // Children point back at their parent
        for (index, node) in self.inner.iter().enumerate() {
            for child in [node.left, node.right] {
                let parent = if is_outer(child) {
                    match self.outer.get(outer_index(child)) {
                        Some(leaf) => leaf.parent,
                        None => return false,
                    }
                } else {
                    match self.inner.get(child as usize) {
                        Some(inner) if inner.critical_bit < node.critical_bit => inner.parent,
                        _ => return false,
                    }
                };
                if parent != index as u64 {
                    return false;
                }
            }
        }

        // Every leaf reaches the root through the sides its key selects
        for (index, leaf) in self.outer.iter().enumerate() {
            let mut child = outer_ref(index as u64);
            let mut parent = leaf.parent;
            let mut steps = 0;
            while parent != ROOT {
                steps += 1;
                if steps > n_inner {
                    return false;
                }
                let Some(node) = self.inner.get(parent as usize) else {
                    return false;
                };
                if node.child_for(leaf.key) != child {
                    return false;
                }
                child = parent;
                parent = node.parent;
            }
            if child != self.root {
                return false;
            }
        }

        true
    }
}

impl Closest {
    #[inline]
    fn index(&self) -> usize {
        outer_index(self.child)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
