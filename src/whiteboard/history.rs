//! Bounded undo/redo history of full snapshots

use std::collections::VecDeque;

/// Snapshot stack with a fixed capacity. Recording past capacity drops the
/// oldest snapshot; recording anything clears the redo side.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: usize,
}

impl<T: Clone> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        self.redo.truncate(self.capacity);
    }

    /// Remember the state before a change
    pub fn record(&mut self, snapshot: T) {
        self.push_undo(snapshot);
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: T) {
        self.undo.push_back(snapshot);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Step back. `current` becomes redoable; returns the state to restore.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward. `current` becomes undoable; returns the state to restore.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.push_undo(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_walk() {
        let mut h = History::new(10);
        let mut state = 0;
        for next in 1..=3 {
            h.record(state);
            state = next;
        }

        state = h.undo(state).unwrap();
        assert_eq!(state, 2);
        state = h.undo(state).unwrap();
        assert_eq!(state, 1);
        state = h.redo(state).unwrap();
        assert_eq!(state, 2);
        assert!(h.can_undo());
        assert!(h.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut h = History::new(2);
        h.record("a");
        h.record("b");
        h.record("c");
        assert_eq!(h.undo_len(), 2);
        assert_eq!(h.undo("d"), Some("c"));
        assert_eq!(h.undo("c"), Some("b"));
        assert_eq!(h.undo("b"), None);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut h = History::new(5);
        h.record(1);
        assert_eq!(h.undo(2), Some(1));
        assert!(h.can_redo());
        h.record(1);
        assert!(!h.can_redo());
    }

    #[test]
    fn test_shrinking_capacity() {
        let mut h = History::new(5);
        for i in 0..5 {
            h.record(i);
        }
        h.set_capacity(2);
        assert_eq!(h.undo_len(), 2);
        assert_eq!(h.undo(9), Some(4));
        assert_eq!(h.capacity(), 2);
    }
}
