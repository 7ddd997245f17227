//! A priority queue over arena allocated items implemented as a binary heap.
//!
//! The heap does not own its items. It stores handles (indices into a slice of items
//! which the caller passes along with every operation) and keeps each items position
//! in the heap up to date through the `HeapPosition` trait.
//! This allows updating the key of an element in `O(log n)` without searching for it first.
//!
//! # Examples
//!
//! ```
//! use ch_router::datastr::index_heap::{HeapPosition, NodeHeap};
//!
//! #[derive(Debug)]
//! struct Item {
//!     key: u32,
//!     heap_index: usize,
//! }
//!
//! // The heap has to be able to store and retrieve the position of each item.
//! impl HeapPosition for Item {
//!     fn heap_index(&self) -> usize {
//!         self.heap_index
//!     }
//!     fn set_heap_index(&mut self, position: usize) {
//!         self.heap_index = position;
//!     }
//! }
//!
//! let mut items: Vec<Item> = [42, 23, 50000].iter().map(|&key| Item { key, heap_index: 0 }).collect();
//! let mut heap = NodeHeap::new(|a: &Item, b: &Item| a.key.cmp(&b.key));
//! for handle in 0..3 {
//!     heap.push(&mut items, handle);
//! }
//! assert_eq!(heap.peek(), Some(1));
//! items[0].key = 1;
//! let position = items[0].heap_index();
//! heap.update_item(&mut items, position);
//! assert_eq!(heap.pop(&mut items), Some(0));
//! ```

use std::cmp::{min, Ordering};

/// Items managed by a `NodeHeap` carry their own position in the heap.
/// Only the heap should ever write this position.
pub trait HeapPosition {
    fn heap_index(&self) -> usize;
    fn set_heap_index(&mut self, position: usize);
}

/// Position value of items which are currently not in any heap.
pub const INVALID_POSITION: usize = std::usize::MAX;

const TREE_ARITY: usize = 2;

/// A binary min heap of handles into an item slice.
/// The ordering is defined by the comparator injected in the constructor.
#[derive(Debug, Clone)]
pub struct NodeHeap<T> {
    data: Vec<u32>,
    compare: fn(&T, &T) -> Ordering,
}

impl<T: HeapPosition> NodeHeap<T> {
    /// Creates an empty heap ordering items ascending by `compare`.
    pub fn new(compare: fn(&T, &T) -> Ordering) -> NodeHeap<T> {
        NodeHeap { data: Vec::new(), compare }
    }

    /// Returns the number of items in the heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all handles from the heap.
    /// The positions stored in the items are left untouched.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns the handle of the smallest item, or None if the heap is empty.
    pub fn peek(&self) -> Option<u32> {
        self.data.first().copied()
    }

    /// Inserts the item with the given handle.
    pub fn push(&mut self, items: &mut [T], item: u32) {
        let insert_position = self.len();
        self.data.push(item);
        items[item as usize].set_heap_index(insert_position);
        self.move_up_in_tree(items, insert_position);
    }

    /// Removes the smallest item and returns its handle, or None if the heap is empty.
    pub fn pop(&mut self, items: &mut [T]) -> Option<u32> {
        if self.is_empty() {
            return None;
        }

        let top = self.data.swap_remove(0);
        items[top as usize].set_heap_index(INVALID_POSITION);
        if !self.is_empty() {
            items[self.data[0] as usize].set_heap_index(0);
            self.move_down_in_tree(items, 0);
        }
        Some(top)
    }

    /// Restores the heap property after the key of the item at `position` was changed.
    /// Works for both increased and decreased keys.
    pub fn update_item(&mut self, items: &mut [T], position: usize) {
        self.move_down_in_tree(items, position);
        self.move_up_in_tree(items, position);
    }

    fn less(&self, items: &[T], a: usize, b: usize) -> bool {
        (self.compare)(&items[self.data[a] as usize], &items[self.data[b] as usize]) == Ordering::Less
    }

    fn swap(&mut self, items: &mut [T], a: usize, b: usize) {
        self.data.swap(a, b);
        items[self.data[a] as usize].set_heap_index(a);
        items[self.data[b] as usize].set_heap_index(b);
    }

    fn move_up_in_tree(&mut self, items: &mut [T], mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;

            if !self.less(items, position, parent) {
                break;
            }

            self.swap(items, parent, position);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, items: &mut [T], mut position: usize) {
        loop {
            let children = Self::children_index_range(position, self.len());
            let smallest_child = match children.reduce(|best, child| if self.less(items, child, best) { child } else { best }) {
                Some(child) => child,
                None => return, // no children at all
            };

            if !self.less(items, smallest_child, position) {
                return; // no child is smaller
            }

            self.swap(items, position, smallest_child);
            position = smallest_child;
        }
    }

    fn children_index_range(parent_index: usize, heap_size: usize) -> std::ops::Range<usize> {
        let first_child = TREE_ARITY * parent_index + 1;
        let last_child = min(TREE_ARITY * parent_index + TREE_ARITY + 1, heap_size);
        first_child..last_child
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Keyed {
        key: u32,
        heap_index: usize,
    }

    impl HeapPosition for Keyed {
        fn heap_index(&self) -> usize {
            self.heap_index
        }
        fn set_heap_index(&mut self, position: usize) {
            self.heap_index = position;
        }
    }

    fn keyed(keys: &[u32]) -> Vec<Keyed> {
        keys.iter()
            .map(|&key| Keyed {
                key,
                heap_index: INVALID_POSITION,
            })
            .collect()
    }

    fn by_key(a: &Keyed, b: &Keyed) -> Ordering {
        a.key.cmp(&b.key)
    }

    #[test]
    fn pops_in_key_order() {
        let mut items = keyed(&[5, 3, 9, 1, 7, 3, 0, 12]);
        let mut heap = NodeHeap::new(by_key);
        for handle in 0..items.len() as u32 {
            heap.push(&mut items, handle);
        }

        let mut keys = Vec::new();
        while let Some(handle) = heap.pop(&mut items) {
            keys.push(items[handle as usize].key);
        }
        assert_eq!(keys, vec![0, 1, 3, 3, 5, 7, 9, 12]);
    }

    #[test]
    fn positions_stay_consistent() {
        let mut items = keyed(&[10, 20, 30, 40, 50, 60]);
        let mut heap = NodeHeap::new(by_key);
        for handle in 0..items.len() as u32 {
            heap.push(&mut items, handle);
        }

        items[5].key = 5;
        let position = items[5].heap_index();
        heap.update_item(&mut items, position);
        items[0].key = 55;
        let position = items[0].heap_index();
        heap.update_item(&mut items, position);

        for (position, &handle) in heap.data.iter().enumerate() {
            assert_eq!(items[handle as usize].heap_index(), position);
        }

        let order: Vec<u32> = std::iter::from_fn(|| heap.pop(&mut items)).collect();
        assert_eq!(order, vec![5, 1, 2, 3, 4, 0]);
        assert!(items.iter().all(|item| item.heap_index() == INVALID_POSITION));
    }

    #[test]
    fn empty_heap() {
        let mut items = keyed(&[]);
        let mut heap = NodeHeap::new(by_key);
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
        assert_eq!(heap.pop(&mut items), None);
    }
}
