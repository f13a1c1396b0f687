// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flattened timeline rows.
//!
//! The row list is what the timeline display iterates: one row per visible
//! effect layer, collapsed element, timing track or view header. It is always
//! rebuilt from scratch and records the store revision it was built from, so a
//! list that outlived a store mutation can be recognised with
//! [`RowList::is_current`].

use crate::element::{Element, ElementId, ElementType};
use crate::store::ElementStore;
use crate::view::ViewRegistry;
use serde::{Deserialize, Serialize};

/// What a row represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// A top-level model row (one effect layer, or the collapsed summary)
    Model,
    /// A timing track
    Timing,
    /// The header row of a view
    ViewHeader,
    /// A member model row shown inside an expanded view
    ViewMember {
        /// The view this row was expanded from
        view: ElementId,
    },
}

/// One row of the flattened timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowInformation {
    /// Element shown on this row
    pub element: ElementId,
    /// Row kind
    pub kind: RowKind,
    /// Effect layer of the element shown on this row
    pub layer_index: usize,
    /// Collapsed flag at flatten time
    pub collapsed: bool,
    /// Active flag at flatten time
    pub active: bool,
    /// Display color slot (distinct per timing track)
    pub color_index: usize,
    /// Position in the row list
    pub index: usize,
}

/// Rows derived from an element store and view registry
#[derive(Debug, Clone, Default)]
pub struct RowList {
    rows: Vec<RowInformation>,
    selected_timing_row: Option<usize>,
    revision: Option<u64>,
}

impl RowList {
    /// Create an empty list that is not current for any store
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `store` into rows.
    ///
    /// Elements are walked in display order and invisible ones are skipped.
    /// The selected timing row is the first active timing track.
    pub fn flatten(store: &ElementStore, views: &ViewRegistry) -> Self {
        let mut flattener = Flattener::default();

        for element in store.elements().filter(|e| e.visible) {
            match element.element_type {
                ElementType::Model => flattener.push_model(element, RowKind::Model),
                ElementType::Timing => flattener.push_timing(element),
                ElementType::View => {
                    flattener.push(element, RowKind::ViewHeader, 0, 0);
                    if element.collapsed {
                        continue;
                    }
                    let kind = RowKind::ViewMember { view: element.id() };
                    for member_name in views.view_members(element.name()) {
                        match store.element(member_name) {
                            Some(member) if member.is_model() => flattener.push_model(member, kind),
                            Some(_) => tracing::trace!(
                                "View {} member {} is not a model, skipped",
                                element.name(),
                                member_name
                            ),
                            None => tracing::trace!(
                                "View {} member {} has no element, skipped",
                                element.name(),
                                member_name
                            ),
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Flattened {} elements into {} rows (selected timing row: {:?})",
            store.element_count(),
            flattener.rows.len(),
            flattener.selected
        );

        Self {
            rows: flattener.rows,
            selected_timing_row: flattener.selected,
            revision: Some(store.revision()),
        }
    }

    /// Whether this list was built from the current state of `store`
    pub fn is_current(&self, store: &ElementStore) -> bool {
        self.revision == Some(store.revision())
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Option<&RowInformation> {
        self.rows.get(index)
    }

    /// Get all rows
    pub fn rows(&self) -> impl Iterator<Item = &RowInformation> {
        self.rows.iter()
    }

    /// Get row count
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Is the list empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the selected timing row
    pub fn selected_timing_row(&self) -> Option<usize> {
        self.selected_timing_row
    }

    /// Override the selected timing row until the next flatten.
    ///
    /// Only timing rows (or `None`) are accepted.
    pub fn set_selected_timing_row(&mut self, row: Option<usize>) -> bool {
        match row {
            Some(index) if self.row(index).map(|r| r.kind) != Some(RowKind::Timing) => false,
            _ => {
                self.selected_timing_row = row;
                true
            }
        }
    }

    /// Resolve the element shown on row `index`
    pub fn element<'a>(&self, index: usize, store: &'a ElementStore) -> Option<&'a Element> {
        self.row(index).and_then(|row| store.element_by_id(row.element))
    }
}

#[derive(Default)]
struct Flattener {
    rows: Vec<RowInformation>,
    timing_rows: usize,
    selected: Option<usize>,
}

impl Flattener {
    fn push(&mut self, element: &Element, kind: RowKind, layer_index: usize, color_index: usize) {
        let index = self.rows.len();
        self.rows.push(RowInformation {
            element: element.id(),
            kind,
            layer_index,
            collapsed: element.collapsed,
            active: element.active,
            color_index,
            index,
        });
    }

    fn push_model(&mut self, element: &Element, kind: RowKind) {
        if element.collapsed {
            self.push(element, kind, 0, 0);
        } else {
            for layer_index in 0..element.effect_layer_count() {
                self.push(element, kind, layer_index, 0);
            }
        }
    }

    fn push_timing(&mut self, element: &Element) {
        if self.selected.is_none() && element.active {
            self.selected = Some(self.rows.len());
        }
        let color_index = self.timing_rows;
        self.push(element, RowKind::Timing, 0, color_index);
        self.timing_rows += 1;
    }
}
