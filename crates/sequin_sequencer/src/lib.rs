// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence element model for Sequin.
//!
//! This crate provides the structural side of a light show sequence:
//! - Elements: models, views (groupings of models) and timing tracks
//! - Effect layers holding timed effects
//! - The flattened row list driving the timeline display
//! - Loading sequence documents with times snapped to a timing grid
//! - Ad hoc selected ranges
//!
//! ## Architecture
//!
//! Elements live in an [`ElementStore`] in display order and are referred to
//! by stable [`ElementId`] handles. A [`RowList`] is derived from the store and
//! a [`ViewRegistry`] and is never patched in place; it remembers the store
//! revision it was built from. [`SequenceModel`] ties the pieces together and
//! rebuilds rows on demand.

pub mod effect;
pub mod element;
pub mod grid;
pub mod layer;
pub mod loader;
pub mod model;
pub mod rows;
pub mod selection;
pub mod settings;
pub mod store;
pub mod view;

pub use effect::{Effect, EffectSelection, EffectTypeLookup, EffectTypeTable, HitKind};
pub use element::{Element, ElementId, ElementType, UnknownElementType};
pub use grid::TimingGrid;
pub use layer::EffectLayer;
pub use loader::{LoadError, LoadReport, LoadWarning, SequenceLoader};
pub use model::SequenceModel;
pub use rows::{RowInformation, RowKind, RowList};
pub use selection::{EffectRange, SelectedRanges};
pub use settings::{SequencerSettings, SettingsError, SETTINGS_FILE_NAME};
pub use store::ElementStore;
pub use view::{ViewEntry, ViewRegistry};
