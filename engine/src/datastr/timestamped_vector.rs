//! A fast resettable vector based on timestamps.

use std::ops::Index;

/// A dense vector which can be reset to its default value in amortized O(1).
/// Each entry remembers the round in which it was last written, entries from
/// earlier rounds read as the default.
/// Used for all per query node data, so each search only pays for the nodes it touches.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    // timestamp for current round. Up to date values will have this one
    current: u32,
    // timestamp of the last write for each entry
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    /// Create a new `TimestampedVector` with `size` elements of the default
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            current: 1,
            timestamps: vec![0; size],
            default,
        }
    }

    /// Reset all elements to the default.
    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // old timestamps may become current again after an overflow, so clear everything for real
        if overflow {
            for element in &mut self.data {
                *element = self.default.clone();
            }
            for timestamp in &mut self.timestamps {
                *timestamp = 0;
            }
            self.current = 1;
        }
    }

    /// Overwrite an individual element for the current round.
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// Was the element written since the last reset?
    pub fn is_set(&self, index: usize) -> bool {
        self.timestamps[index] == self.current
    }

    /// Number of elements in the data structure
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Are there no elements in the data structure
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.is_set(index) {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_default() {
        let mut distances = TimestampedVector::new(4, f64::INFINITY);
        distances.reset();
        distances.set(2, 3.5);
        assert_eq!(distances[2], 3.5);
        assert!(distances.is_set(2));
        assert_eq!(distances[1], f64::INFINITY);

        distances.reset();
        assert_eq!(distances[2], f64::INFINITY);
        assert!(!distances.is_set(2));
    }
}
