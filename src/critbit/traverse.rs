//! Ordered traversal with cursors.
//!
//! A [`Cursor`] remembers the key, the outer node and its parent, so the
//! next step only climbs from there instead of searching from the root.
//! [`CritBitTree::traverse_pop`] steps and removes the departed node in
//! one call, which is how the matching loop consumes the book.

use crate::critbit::node::{is_set, outer_index, outer_ref, ROOT};
use crate::critbit::CritBitTree;
use crate::error::{TreeError, TreeResult};

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward larger keys
    Successor,
    /// Toward smaller keys
    Predecessor,
}

impl Direction {
    #[inline]
    fn toward_right(self) -> bool {
        self == Direction::Successor
    }
}

/// Position of a traversal at one outer node.
///
/// Valid until the tree is mutated by anything other than
/// [`CritBitTree::traverse_pop`] on this cursor or writes through
/// [`CritBitTree::value_mut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    key: u128,
    parent: u64,
    child: u64,
}

impl Cursor {
    /// Key at the cursor
    #[inline]
    pub fn key(&self) -> u128 {
        self.key
    }
}

impl<V> CritBitTree<V> {
    fn cursor_at(&self, child: u64) -> Cursor {
        let leaf = &self.outer[outer_index(child)];
        Cursor {
            key: leaf.key,
            parent: leaf.parent,
            child,
        }
    }

    /// Cursor at the minimum key (successor walk) or the maximum key
    /// (predecessor walk).
    pub fn traverse_init(&self, direction: Direction) -> TreeResult<Cursor> {
        if self.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        // Start at the end opposite to the direction of travel
        let child = self.descend(self.root, !direction.toward_right());
        Ok(self.cursor_at(child))
    }

    /// Step one key in `direction`, or `None` past the last key.
    ///
    /// Climbs to the first ancestor where the cursor's key went the other
    /// way, crosses over, then descends to the nearest leaf.
    pub fn traverse_next(&self, cursor: &Cursor, direction: Direction) -> Option<Cursor> {
        let toward_right = direction.toward_right();
        let mut node = cursor.parent;
        while node != ROOT {
            let inner = &self.inner[node as usize];
            if is_set(cursor.key, inner.critical_bit) != toward_right {
                let (across, nearest_rightmost) = if toward_right {
                    (inner.right, false)
                } else {
                    (inner.left, true)
                };
                return Some(self.cursor_at(self.descend(across, nearest_rightmost)));
            }
            node = inner.parent;
        }
        None
    }

    /// Step past the cursor, then remove the key it was on.
    ///
    /// Returns the removed value and a cursor at the next key, which stays
    /// valid even though removal relocates up to one outer node.
    pub fn traverse_pop(&mut self, cursor: Cursor, direction: Direction) -> (V, Option<Cursor>) {
        let next = self.traverse_next(&cursor, direction);
        let last = outer_ref(self.outer.len() as u64 - 1);
        let value = self.remove_outer(cursor.child);

        let next = next.map(|mut next| {
            if next.child == last {
                // Swap-remove moved it into the departed slot
                next.child = cursor.child;
            }
            next.parent = self.outer[outer_index(next.child)].parent;
            next
        });
        (value, next)
    }

    #[inline]
    pub fn successor(&self, cursor: &Cursor) -> Option<Cursor> {
        self.traverse_next(cursor, Direction::Successor)
    }

    #[inline]
    pub fn predecessor(&self, cursor: &Cursor) -> Option<Cursor> {
        self.traverse_next(cursor, Direction::Predecessor)
    }

    #[inline]
    pub fn pop_successor(&mut self, cursor: Cursor) -> (V, Option<Cursor>) {
        self.traverse_pop(cursor, Direction::Successor)
    }

    #[inline]
    pub fn pop_predecessor(&mut self, cursor: Cursor) -> (V, Option<Cursor>) {
        self.traverse_pop(cursor, Direction::Predecessor)
    }

    /// Value at the cursor
    #[inline]
    pub fn value(&self, cursor: &Cursor) -> &V {
        &self.outer[outer_index(cursor.child)].value
    }

    /// Mutable value at the cursor
    #[inline]
    pub fn value_mut(&mut self, cursor: &Cursor) -> &mut V {
        &mut self.outer[outer_index(cursor.child)].value
    }

    /// In-order iterator over `(key, &value)`
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            tree: self,
            front: self.traverse_init(Direction::Successor).ok(),
            back: self.traverse_init(Direction::Predecessor).ok(),
            remaining: self.len(),
        }
    }
}

/// Ascending iterator over a [`CritBitTree`], double-ended.
#[derive(Debug, Clone)]
pub struct Iter<'a, V> {
    tree: &'a CritBitTree<V>,
    front: Option<Cursor>,
    back: Option<Cursor>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u128, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cursor = self.front?;
        self.remaining -= 1;
        self.front = self.tree.successor(&cursor);
        Some((cursor.key, self.tree.value(&cursor)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, V> DoubleEndedIterator for Iter<'a, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cursor = self.back?;
        self.remaining -= 1;
        self.back = self.tree.predecessor(&cursor);
        Some((cursor.key, self.tree.value(&cursor)))
    }
}

impl<'a, V> ExactSizeIterator for Iter<'a, V> {}

impl<'a, V> IntoIterator for &'a CritBitTree<V> {
    type Item = (u128, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
