// SPDX-License-Identifier: MIT OR Apache-2.0
//! Element (track) definitions for the sequencer.

use crate::layer::EffectLayer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable handle to an element.
///
/// Handles are never reused, so a handle to a deleted element simply stops
/// resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// A model with effect layers
    Model,
    /// A grouping of models listed in the view registry
    View,
    /// Timing marks
    Timing,
}

impl ElementType {
    /// Name used in sequence documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::View => "view",
            Self::Timing => "timing",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized element type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element type: {0:?}")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(Self::Model),
            "view" => Ok(Self::View),
            "timing" => Ok(Self::Timing),
            other => Err(UnknownElementType(other.to_string())),
        }
    }
}

/// A named track in the sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    id: ElementId,
    name: String,
    /// Element type
    pub element_type: ElementType,
    /// Whether the element is shown as a top-level row
    pub visible: bool,
    /// Collapsed elements show a single row
    pub collapsed: bool,
    /// Active flag (selects a timing track)
    pub active: bool,
    /// Order key
    pub index: usize,
    /// Effect layers owned by this element
    layers: Vec<EffectLayer>,
}

impl Element {
    /// Create a new element with no effect layers
    pub fn new(
        name: impl Into<String>,
        element_type: ElementType,
        visible: bool,
        collapsed: bool,
        active: bool,
    ) -> Self {
        Self {
            id: ElementId::new(),
            name: name.into(),
            element_type,
            visible,
            collapsed,
            active,
            index: 0,
            layers: Vec::new(),
        }
    }

    /// Stable handle
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Element name, unique within a store. Renames go through
    /// [`ElementStore::rename_element`](crate::ElementStore::rename_element).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Append an empty effect layer and return it
    pub fn add_effect_layer(&mut self) -> &mut EffectLayer {
        self.layers.push(EffectLayer::new());
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    /// Remove the effect layer at `index`
    pub fn remove_effect_layer(&mut self, index: usize) -> Option<EffectLayer> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    /// Get an effect layer
    pub fn effect_layer(&self, index: usize) -> Option<&EffectLayer> {
        self.layers.get(index)
    }

    /// Get a mutable effect layer
    pub fn effect_layer_mut(&mut self, index: usize) -> Option<&mut EffectLayer> {
        self.layers.get_mut(index)
    }

    /// Get all effect layers
    pub fn effect_layers(&self) -> impl Iterator<Item = &EffectLayer> {
        self.layers.iter()
    }

    /// Get mutable effect layers
    pub fn effect_layers_mut(&mut self) -> impl Iterator<Item = &mut EffectLayer> {
        self.layers.iter_mut()
    }

    /// Get effect layer count
    pub fn effect_layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Is this a model element
    pub fn is_model(&self) -> bool {
        self.element_type == ElementType::Model
    }

    /// Is this a timing element
    pub fn is_timing(&self) -> bool {
        self.element_type == ElementType::Timing
    }

    /// Is this a view element
    pub fn is_view(&self) -> bool {
        self.element_type == ElementType::View
    }
}
