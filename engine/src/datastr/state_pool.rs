//! Arena of per node search records.
//!
//! Searches need one record per node they touch. Instead of allocating those for every query,
//! records are handed out from a pool which is rewound (not freed) between queries.
//! Records are referred to by `StateId` handles into the arena.

use super::{graph::*, index_heap::*};
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

/// Handle of a record in a `StatePool`
pub type StateId = u32;

/// Search record of a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub id: NodeId,
    pub dist: Weight,
    /// Node from which the current `dist` was reached
    pub prev: Option<NodeId>,
    /// Settled, the distance is final
    pub visited: bool,
    /// Was inserted into the queue at some point
    pub opened: bool,
    /// Maintained by the `NodeHeap`
    pub heap_index: usize,
    /// Edge over which the node was reached
    pub attrs: Option<EdgeId>,
}

impl NodeState {
    fn new(id: NodeId, dist: Weight) -> NodeState {
        NodeState {
            id,
            dist,
            prev: None,
            visited: false,
            opened: false,
            heap_index: INVALID_POSITION,
            attrs: None,
        }
    }

    /// Queue order of search records, by tentative distance
    pub fn compare(a: &NodeState, b: &NodeState) -> Ordering {
        a.dist.total_cmp(&b.dist)
    }
}

impl HeapPosition for NodeState {
    #[inline(always)]
    fn heap_index(&self) -> usize {
        self.heap_index
    }

    #[inline(always)]
    fn set_heap_index(&mut self, position: usize) {
        self.heap_index = position;
    }
}

/// Cursor based arena of `NodeState`s.
#[derive(Debug, Clone, Default)]
pub struct StatePool {
    states: Vec<NodeState>,
    // number of records handed out since the last reset
    current: usize,
}

impl StatePool {
    pub fn new() -> StatePool {
        Self::default()
    }

    /// Hand out a record for `id` with the given distance and all other fields cleared.
    /// Reuses a record from before the last reset if there is one.
    pub fn create_state(&mut self, id: NodeId, dist: Weight) -> StateId {
        let handle = self.current;
        if let Some(recycled) = self.states.get_mut(handle) {
            *recycled = NodeState::new(id, dist);
        } else {
            self.states.push(NodeState::new(id, dist));
        }
        self.current += 1;
        handle as StateId
    }

    /// Rewind the cursor. All handles handed out before become invalid.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Number of records in use since the last reset
    pub fn len(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records ever allocated
    pub fn capacity(&self) -> usize {
        self.states.len()
    }

    /// All records, for handing them to a `NodeHeap`
    pub fn states_mut(&mut self) -> &mut [NodeState] {
        &mut self.states
    }
}

impl Index<StateId> for StatePool {
    type Output = NodeState;

    fn index(&self, handle: StateId) -> &NodeState {
        debug_assert!((handle as usize) < self.current);
        &self.states[handle as usize]
    }
}

impl IndexMut<StateId> for StatePool {
    fn index_mut(&mut self, handle: StateId) -> &mut NodeState {
        debug_assert!((handle as usize) < self.current);
        &mut self.states[handle as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_reuses_records() {
        let mut pool = StatePool::new();
        let a = pool.create_state(3, 0.0);
        let b = pool.create_state(7, INFINITY);
        pool[b].visited = true;
        pool[b].prev = Some(3);
        assert_eq!((a, b), (0, 1));
        assert_eq!(pool.capacity(), 2);

        pool.reset();
        assert!(pool.is_empty());
        let c = pool.create_state(9, 1.5);
        let d = pool.create_state(2, INFINITY);
        assert_eq!((c, d), (0, 1));
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool[d], NodeState::new(2, INFINITY));
        assert_eq!(pool[c].id, 9);
        assert_eq!(pool[c].dist, 1.5);

        pool.create_state(4, 0.0);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.len(), 3);
    }
}
