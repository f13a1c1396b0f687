// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect definitions and the effect type lookup.

use serde::{Deserialize, Serialize};

/// Selection state of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectSelection {
    /// Not selected
    #[default]
    NotSelected,
    /// Left edge grabbed (start time being dragged)
    LeftEdge,
    /// Right edge grabbed (end time being dragged)
    RightEdge,
    /// Whole effect selected
    Selected,
}

impl EffectSelection {
    /// Whether the effect is selected in any way
    pub fn is_selected(&self) -> bool {
        !matches!(self, Self::NotSelected)
    }
}

/// Which part of an effect a position hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    /// Inside the leading edge zone
    LeftEdge,
    /// Inside the trailing edge zone
    RightEdge,
    /// Anywhere else inside the effect
    Body,
}

impl From<HitKind> for EffectSelection {
    fn from(hit: HitKind) -> Self {
        match hit {
            HitKind::LeftEdge => Self::LeftEdge,
            HitKind::RightEdge => Self::RightEdge,
            HitKind::Body => Self::Selected,
        }
    }
}

/// A timed effect instance on an effect layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Effect ID as persisted in the document
    pub id: i32,
    /// Index into the effect type table (`None` for timing marks and unknown types)
    pub effect_type_index: Option<usize>,
    /// Effect type name
    pub name: String,
    /// Opaque settings payload
    pub settings: String,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Current selection state
    pub selection: EffectSelection,
    /// Protected effects are not meant to be moved or edited
    pub protected: bool,
}

impl Effect {
    /// Create a new unselected effect spanning `start_time..=end_time`.
    ///
    /// Reversed bounds are swapped so that `start_time <= end_time` holds.
    pub fn new(name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        let (start_time, end_time) = ordered(start_time, end_time);
        Self {
            id: 0,
            effect_type_index: None,
            name: name.into(),
            settings: String::new(),
            start_time,
            end_time,
            selection: EffectSelection::NotSelected,
            protected: false,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether `position` lies within the effect bounds (inclusive)
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start_time && position <= self.end_time
    }

    /// Whether the effect overlaps the closed range `start..=end`
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        let (start, end) = ordered(start, end);
        self.start_time <= end && self.end_time >= start
    }
}

pub(crate) fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Resolves effect type names to stable numeric indices
pub trait EffectTypeLookup {
    /// Index of the effect type called `name`, if known
    fn effect_index(&self, name: &str) -> Option<usize>;
}

/// Effect type names available to the sequencer, in index order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTypeTable {
    names: Vec<String>,
}

impl EffectTypeTable {
    /// Built-in effect type names
    pub const BUILTIN: &'static [&'static str] = &[
        "Off",
        "On",
        "Bars",
        "Butterfly",
        "Circles",
        "Color Wash",
        "Curtain",
        "Fire",
        "Fireworks",
        "Garlands",
        "Life",
        "Meteors",
        "Pinwheel",
        "Ripple",
        "Shimmer",
        "Single Strand",
        "Snowflakes",
        "Snowstorm",
        "Spirals",
        "Spirograph",
        "Text",
        "Tree",
        "Twinkle",
        "Wave",
    ];

    /// Create a table from a list of names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the effect type at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of known effect types
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for EffectTypeTable {
    fn default() -> Self {
        Self::new(Self::BUILTIN.iter().copied())
    }
}

impl EffectTypeLookup for EffectTypeTable {
    fn effect_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
