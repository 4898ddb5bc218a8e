//! Block arena with typed, index-based handles.
//!
//! Values are stored in fixed-capacity blocks. A full block is never grown, a
//! fresh block is appended instead, so a stored value keeps its address for
//! the lifetime of the arena. There is no way to release a single value; the
//! whole arena goes away at once.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU32;

/// Number of slots in every block.
pub const BLOCK_CAPACITY: usize = 1024;

/// Handle to a value stored in an [`Arena<T>`].
///
/// Stored as index + 1 so that `Option<Id<T>>` has the size of a `u32`.
pub struct Id<T> {
    raw: NonZeroU32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(|raw| Id {
            raw,
            _marker: PhantomData,
        })
    }

    pub fn get(self) -> u32 {
        self.raw.get()
    }

    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

/// Append-only storage made of fixed-size blocks.
pub struct Arena<T> {
    blocks: Vec<Vec<T>>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        // Cloned blocks must keep their full capacity or later pushes would reallocate.
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                let mut copy = Vec::with_capacity(BLOCK_CAPACITY);
                copy.extend(block.iter().cloned());
                copy
            })
            .collect();
        Arena { blocks, len: self.len }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            blocks: Vec::new(),
            len: 0,
        }
    }

    /// Store `value` and return its handle.
    pub fn alloc(&mut self, value: T) -> Id<T> {
        let needs_block = match self.blocks.last() {
            Some(block) => block.len() == BLOCK_CAPACITY,
            None => true,
        };
        if needs_block {
            self.blocks.push(Vec::with_capacity(BLOCK_CAPACITY));
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push(value);
        }
        self.len += 1;
        match Id::new(self.len as u32) {
            Some(id) => id,
            None => unreachable!("arena length starts at one after the first push"),
        }
    }

    pub fn get(&self, id: Id<T>) -> &T {
        let index = id.index();
        &self.blocks[index / BLOCK_CAPACITY][index % BLOCK_CAPACITY]
    }

    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        let index = id.index();
        &mut self.blocks[index / BLOCK_CAPACITY][index % BLOCK_CAPACITY]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Handles of every stored value, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        (1..=self.len as u32).filter_map(Id::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.ids().map(move |id| (id, self.get(id)))
    }
}

impl<T> std::ops::Index<Id<T>> for Arena<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> std::ops::IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_spans_blocks_without_moving_values() {
        let mut arena = Arena::new();
        let first = arena.alloc(String::from("first"));
        let address = arena.get(first).as_ptr();
        for i in 0..(BLOCK_CAPACITY * 2) {
            arena.alloc(i.to_string());
        }
        assert_eq!(arena.block_count(), 3);
        assert_eq!(arena.get(first).as_ptr(), address);
        assert_eq!(arena.len(), BLOCK_CAPACITY * 2 + 1);
    }

    #[test]
    fn test_ids_follow_allocation_order() {
        let mut arena = Arena::new();
        let a = arena.alloc('a');
        let b = arena.alloc('b');
        assert!(a < b);
        assert_eq!(a.get(), 1);
        let collected: Vec<char> = arena.iter().map(|(_, c)| *c).collect();
        assert_eq!(collected, vec!['a', 'b']);
        assert_eq!(std::mem::size_of::<Option<Id<char>>>(), 4);
    }

    #[test]
    fn test_debug_reports_size() {
        struct Opaque;
        let mut arena = Arena::new();
        arena.alloc(Opaque);
        arena.alloc(Opaque);
        assert_eq!(format!("{:?}", arena), "Arena { len: 2, blocks: 1 }");
    }
}
