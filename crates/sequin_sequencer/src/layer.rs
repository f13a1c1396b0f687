// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect layers.
//!
//! A layer keeps its effects ordered by start time. Positions passed to the
//! hit-test and range selection methods are in seconds, on the same axis as
//! the effect bounds.

use crate::effect::{ordered, Effect, EffectSelection, HitKind};
use serde::{Deserialize, Serialize};

/// Fraction of an effect's span treated as a grab zone at each edge
const EDGE_ZONE_FRACTION: f64 = 0.1;

/// An overlay of effects within an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectLayer {
    effects: Vec<Effect>,
}

impl EffectLayer {
    /// Create an empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect and return the index it landed at
    pub fn add_effect(
        &mut self,
        id: i32,
        effect_type_index: Option<usize>,
        name: impl Into<String>,
        settings: impl Into<String>,
        start_time: f64,
        end_time: f64,
        selection: EffectSelection,
        protected: bool,
    ) -> usize {
        let (start_time, end_time) = ordered(start_time, end_time);
        let effect = Effect {
            id,
            effect_type_index,
            name: name.into(),
            settings: settings.into(),
            start_time,
            end_time,
            selection,
            protected,
        };
        self.insert(effect)
    }

    /// Insert a fully built effect, keeping start order
    pub fn insert(&mut self, effect: Effect) -> usize {
        // Equal start times keep insertion order
        let index = self
            .effects
            .partition_point(|e| e.start_time <= effect.start_time);
        self.effects.insert(index, effect);
        index
    }

    /// Remove the effect at `index`
    pub fn remove_effect(&mut self, index: usize) -> Option<Effect> {
        (index < self.effects.len()).then(|| self.effects.remove(index))
    }

    /// Get an effect by index
    pub fn effect(&self, index: usize) -> Option<&Effect> {
        self.effects.get(index)
    }

    /// Get a mutable effect by index
    pub fn effect_mut(&mut self, index: usize) -> Option<&mut Effect> {
        self.effects.get_mut(index)
    }

    /// Get all effects in start order
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Get effect count
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Find the effect containing `position` and which part of it was hit
    pub fn effect_index_containing_position(&self, position: f64) -> Option<(usize, HitKind)> {
        let index = self.effects.iter().position(|e| e.contains(position))?;
        let effect = &self.effects[index];
        let zone = effect.duration() * EDGE_ZONE_FRACTION;

        let hit = if position <= effect.start_time + zone {
            HitKind::LeftEdge
        } else if position >= effect.end_time - zone {
            HitKind::RightEdge
        } else {
            HitKind::Body
        };
        Some((index, hit))
    }

    /// Select every effect overlapping `start..=end`.
    ///
    /// Returns the index of the first effect selected, if any.
    pub fn select_effects_in_range(&mut self, start: f64, end: f64) -> Option<usize> {
        let mut first = None;
        for (index, effect) in self.effects.iter_mut().enumerate() {
            if effect.overlaps(start, end) {
                effect.selection = EffectSelection::Selected;
                first.get_or_insert(index);
            }
        }
        first
    }

    /// Clear the selection state of every effect
    pub fn unselect_all(&mut self) {
        for effect in &mut self.effects {
            effect.selection = EffectSelection::NotSelected;
        }
    }

    /// Iterate over selected effects with their indices
    pub fn selected_effects(&self) -> impl Iterator<Item = (usize, &Effect)> {
        self.effects
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selection.is_selected())
    }
}
