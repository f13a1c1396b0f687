// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ad hoc selected time spans.

use serde::{Deserialize, Serialize};

/// A selected span on one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectRange {
    /// Row index
    pub row: usize,
    /// Span start
    pub start_x: f64,
    /// Span end
    pub end_x: f64,
}

impl EffectRange {
    /// Create a new range
    pub fn new(row: usize, start_x: f64, end_x: f64) -> Self {
        Self { row, start_x, end_x }
    }
}

/// List of selected ranges. Overlapping ranges are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedRanges {
    ranges: Vec<EffectRange>,
}

impl SelectedRanges {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a range
    pub fn add(&mut self, range: EffectRange) {
        self.ranges.push(range);
    }

    /// Remove the range at `index`; out-of-bounds indices are ignored
    pub fn delete(&mut self, index: usize) -> Option<EffectRange> {
        (index < self.ranges.len()).then(|| self.ranges.remove(index))
    }

    /// Remove all ranges
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Get a range by index
    pub fn get(&self, index: usize) -> Option<&EffectRange> {
        self.ranges.get(index)
    }

    /// Get range count
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Is the list empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Get all ranges
    pub fn iter(&self) -> impl Iterator<Item = &EffectRange> {
        self.ranges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_delete() {
        let mut ranges = SelectedRanges::new();
        ranges.add(EffectRange::new(0, 1.0, 2.0));
        ranges.add(EffectRange::new(0, 1.5, 3.0));
        ranges.add(EffectRange::new(2, 0.0, 0.5));
        assert_eq!(ranges.len(), 3);

        assert_eq!(ranges.delete(1), Some(EffectRange::new(0, 1.5, 3.0)));
        assert_eq!(ranges.get(1).map(|r| r.row), Some(2));

        assert_eq!(ranges.delete(5), None);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut ranges = SelectedRanges::new();
        let range = EffectRange::new(1, 0.0, 1.0);
        ranges.add(range);
        ranges.add(range);
        assert_eq!(ranges.iter().filter(|r| **r == range).count(), 2);

        ranges.clear();
        assert!(ranges.is_empty());
        assert!(ranges.get(0).is_none());
    }
}
