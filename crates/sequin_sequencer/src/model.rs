// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence model: elements, views, rows and selected ranges together.
//!
//! Row queries on [`SequenceModel`] re-flatten first whenever the element
//! store changed since the last flatten, so callers never see stale rows.

use crate::effect::{Effect, EffectTypeLookup, HitKind};
use crate::element::{Element, ElementId, ElementType};
use crate::grid::TimingGrid;
use crate::loader::{LoadError, LoadReport, SequenceLoader};
use crate::rows::{RowInformation, RowList};
use crate::selection::{EffectRange, SelectedRanges};
use crate::store::ElementStore;
use crate::view::ViewRegistry;
use std::path::Path;

/// In-memory model of a sequence
#[derive(Debug, Clone, Default)]
pub struct SequenceModel {
    store: ElementStore,
    views: ViewRegistry,
    rows: RowList,
    ranges: SelectedRanges,
}

impl SequenceModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model using `views` for view membership
    pub fn with_views(views: ViewRegistry) -> Self {
        Self {
            views,
            ..Self::default()
        }
    }

    /// Element store
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Mutable element store
    pub fn store_mut(&mut self) -> &mut ElementStore {
        &mut self.store
    }

    /// View registry
    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Replace the view registry. Rows are rebuilt on the next query.
    pub fn set_view_registry(&mut self, views: ViewRegistry) {
        self.views = views;
        self.rows = RowList::new();
    }

    /// Comma-joined member list of a view
    pub fn get_view_models(&self, view_name: &str) -> &str {
        self.views.get_view_models(view_name)
    }

    /// Add an element unless the name is taken
    pub fn add_element(
        &mut self,
        name: impl Into<String>,
        element_type: ElementType,
        visible: bool,
        collapsed: bool,
        active: bool,
    ) -> ElementId {
        self.store
            .add_element(name, element_type, visible, collapsed, active)
    }

    /// Get element count
    pub fn element_count(&self) -> usize {
        self.store.element_count()
    }

    /// Check whether an element exists
    pub fn element_exists(&self, name: &str) -> bool {
        self.store.element_exists(name)
    }

    /// Get an element by name
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.store.element(name)
    }

    /// Get an element by display position
    pub fn element_at(&self, position: usize) -> Option<&Element> {
        self.store.element_at(position)
    }

    /// Remove every element called `name`
    pub fn delete_element(&mut self, name: &str) -> usize {
        self.store.delete_element(name)
    }

    /// Reorder an element, see [`ElementStore::move_element`]
    pub fn move_element(&mut self, index: usize, destination: usize) -> bool {
        self.store.move_element(index, destination)
    }

    /// Stable sort of elements by order key
    pub fn sort_elements(&mut self) {
        self.store.sort_elements();
    }

    /// Clear the active flag of every timing element
    pub fn deactivate_all_timing_elements(&mut self) {
        self.store.deactivate_all_timing_elements();
    }

    /// Load a sequence document, replacing all elements.
    ///
    /// Effect times are snapped to `grid`. Selected ranges are kept.
    pub fn load_sequence(
        &mut self,
        xml: &str,
        grid: TimingGrid,
        effect_types: &dyn EffectTypeLookup,
    ) -> LoadReport {
        let loader = SequenceLoader::new(grid, effect_types);
        let (rows, report) = loader.load_str(xml, &mut self.store, &self.views);
        self.rows = rows;
        report
    }

    /// Load a sequence file, replacing all elements
    pub fn load_sequence_file(
        &mut self,
        path: &Path,
        grid: TimingGrid,
        effect_types: &dyn EffectTypeLookup,
    ) -> Result<LoadReport, LoadError> {
        let loader = SequenceLoader::new(grid, effect_types);
        let (rows, report) = loader.load_file(path, &mut self.store, &self.views)?;
        self.rows = rows;
        Ok(report)
    }

    /// Rebuild the row list unconditionally
    pub fn populate_row_information(&mut self) {
        self.rows = RowList::flatten(&self.store, &self.views);
    }

    fn refresh_rows(&mut self) {
        if !self.rows.is_current(&self.store) {
            self.populate_row_information();
        }
    }

    /// Current rows
    pub fn rows(&mut self) -> &RowList {
        self.refresh_rows();
        &self.rows
    }

    /// Get a row by index
    pub fn row_information(&mut self, index: usize) -> Option<&RowInformation> {
        self.refresh_rows();
        self.rows.row(index)
    }

    /// Get row count
    pub fn row_count(&mut self) -> usize {
        self.refresh_rows();
        self.rows.len()
    }

    /// Element shown on a row
    pub fn row_element(&mut self, index: usize) -> Option<&Element> {
        self.refresh_rows();
        self.rows.element(index, &self.store)
    }

    /// Index of the selected timing row
    pub fn selected_timing_row(&mut self) -> Option<usize> {
        self.refresh_rows();
        self.rows.selected_timing_row()
    }

    /// Override the selected timing row until the rows are rebuilt
    pub fn set_selected_timing_row(&mut self, row: Option<usize>) -> bool {
        self.refresh_rows();
        self.rows.set_selected_timing_row(row)
    }

    /// Select effects overlapping `start_x..=end_x` on rows `start_row..=end_row`.
    ///
    /// `end_row` is clamped to the last row. Returns the row and effect index
    /// of the first effect selected.
    pub fn select_effects_in_row_and_position_range(
        &mut self,
        start_row: usize,
        end_row: usize,
        start_x: f64,
        end_x: f64,
    ) -> Option<(usize, usize)> {
        self.refresh_rows();
        if start_row >= self.rows.len() {
            return None;
        }
        let end_row = end_row.min(self.rows.len() - 1);

        let mut first = None;
        for row in self.rows.rows().skip(start_row).take(end_row + 1 - start_row) {
            let Some(layer) = self.store.effect_layer_mut(row.element, row.layer_index) else {
                continue;
            };
            if let Some(index) = layer.select_effects_in_range(start_x, end_x) {
                first.get_or_insert((row.index, index));
            }
        }
        first
    }

    /// Hit-test row `row` at position `x`
    pub fn selected_effect_at_row_and_position(
        &mut self,
        row: usize,
        x: f64,
    ) -> Option<(usize, HitKind, &Effect)> {
        self.refresh_rows();
        let row = *self.rows.row(row)?;
        let layer = self
            .store
            .element_by_id(row.element)?
            .effect_layer(row.layer_index)?;
        let (index, hit) = layer.effect_index_containing_position(x)?;
        layer.effect(index).map(|effect| (index, hit, effect))
    }

    /// Clear the selection of every effect shown on a row
    pub fn unselect_all_effects(&mut self) {
        self.refresh_rows();
        for row in self.rows.rows() {
            if let Some(layer) = self.store.effect_layer_mut(row.element, row.layer_index) {
                layer.unselect_all();
            }
        }
    }

    /// Selected ranges
    pub fn selected_ranges(&self) -> &SelectedRanges {
        &self.ranges
    }

    /// Get selected range count
    pub fn selected_range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Get a selected range
    pub fn selected_range(&self, index: usize) -> Option<&EffectRange> {
        self.ranges.get(index)
    }

    /// Add a selected range
    pub fn add_selected_range(&mut self, range: EffectRange) {
        self.ranges.add(range);
    }

    /// Remove a selected range; out-of-bounds indices are ignored
    pub fn delete_selected_range(&mut self, index: usize) {
        self.ranges.delete(index);
    }

    /// Remove all selected ranges
    pub fn clear_selected_ranges(&mut self) {
        self.ranges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectSelection, EffectTypeTable};
    use crate::rows::RowKind;

    const SHOW: &str = r#"<xsequence>
      <DisplayElements>
        <Element name="Beats" type="timing" visible="1" active="0"/>
        <Element name="Lyrics" type="timing" visible="1" active="1"/>
        <Element name="Arch" type="model" visible="1" collapsed="0"/>
        <Element name="Yard" type="view" visible="1" collapsed="0"/>
      </DisplayElements>
      <ElementEffects>
        <Element name="Arch" type="model">
          <EffectLayer>
            <Effect name="On" id="1" startTime="0.0" endTime="1.0"/>
            <Effect name="Bars" id="2" startTime="2.0" endTime="3.0"/>
          </EffectLayer>
          <EffectLayer>
            <Effect name="Fire" id="3" startTime="0.5" endTime="2.5"/>
          </EffectLayer>
        </Element>
        <Element name="Tree" type="model">
          <EffectLayer>
            <Effect name="Twinkle" id="4" startTime="1.0" endTime="4.0"/>
          </EffectLayer>
        </Element>
      </ElementEffects>
    </xsequence>"#;

    fn loaded() -> SequenceModel {
        let mut views = ViewRegistry::new();
        views.add_view("Yard", "Tree");
        let mut model = SequenceModel::with_views(views);
        let grid = TimingGrid::with_frequency(20.0);
        let report = model.load_sequence(SHOW, grid, &EffectTypeTable::default());
        assert!(report.is_clean(), "{:?}", report.warnings);
        model
    }

    fn row_names(model: &mut SequenceModel) -> Vec<String> {
        (0..model.row_count())
            .map(|i| model.row_element(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_load_and_rows() {
        let mut model = loaded();
        assert_eq!(model.element_count(), 5);
        assert!(!model.element("Tree").unwrap().visible);
        assert_eq!(model.get_view_models("Yard"), "Tree");

        assert_eq!(row_names(&mut model), vec!["Beats", "Lyrics", "Arch", "Arch", "Yard", "Tree"]);
        assert_eq!(model.selected_timing_row(), Some(1));
        assert_eq!(model.row_information(1).unwrap().color_index, 1);
        assert!(model.row_information(6).is_none());
    }

    #[test]
    fn test_rows_follow_mutations() {
        let mut model = loaded();
        assert_eq!(model.row_count(), 6);

        model.store_mut().set_collapsed("Arch", true);
        assert_eq!(row_names(&mut model), vec!["Beats", "Lyrics", "Arch", "Yard", "Tree"]);

        assert!(model.move_element(2, 0));
        assert_eq!(model.row_information(0).unwrap().kind, RowKind::Model);
        assert_eq!(model.selected_timing_row(), Some(2));

        model.delete_element("Lyrics");
        assert_eq!(row_names(&mut model), vec!["Arch", "Beats", "Yard", "Tree"]);
        assert_eq!(model.selected_timing_row(), None);

        model.store_mut().set_active("Beats", true);
        assert_eq!(model.selected_timing_row(), Some(1));
        model.deactivate_all_timing_elements();
        assert_eq!(model.selected_timing_row(), None);
    }

    #[test]
    fn test_registry_change_rebuilds_rows() {
        let mut model = loaded();
        assert_eq!(model.row_count(), 6);
        model.set_view_registry(ViewRegistry::new());
        assert_eq!(row_names(&mut model), vec!["Beats", "Lyrics", "Arch", "Arch", "Yard"]);
    }

    #[test]
    fn test_range_selection_across_rows() {
        let mut model = loaded();

        // Rows 2 and 3 are Arch's layers, row 5 is Tree inside the view
        let first = model.select_effects_in_row_and_position_range(2, 99, 1.9, 2.2);
        assert_eq!(first, Some((2, 1)));

        let arch = model.element("Arch").unwrap();
        let selected = |layer: usize| -> Vec<i32> {
            arch.effect_layer(layer)
                .unwrap()
                .selected_effects()
                .map(|(_, e)| e.id)
                .collect()
        };
        assert_eq!(selected(0), vec![2]);
        assert_eq!(selected(1), vec![3]);
        let tree = model.element("Tree").unwrap();
        assert_eq!(tree.effect_layer(0).unwrap().selected_effects().count(), 1);

        // Selection does not disturb a manual timing row choice
        assert!(model.set_selected_timing_row(Some(0)));
        model.unselect_all_effects();
        assert_eq!(model.selected_timing_row(), Some(0));
        let arch = model.element("Arch").unwrap();
        assert!(arch
            .effect_layers()
            .all(|layer| layer.selected_effects().count() == 0));

        assert_eq!(model.select_effects_in_row_and_position_range(6, 8, 0.0, 10.0), None);
    }

    #[test]
    fn test_hit_test() {
        let mut model = loaded();
        let (index, hit, effect) = model.selected_effect_at_row_and_position(3, 1.5).unwrap();
        assert_eq!(index, 0);
        assert_eq!(hit, HitKind::Body);
        assert_eq!(effect.name, "Fire");

        let (_, hit, _) = model.selected_effect_at_row_and_position(2, 2.95).unwrap();
        assert_eq!(hit, HitKind::RightEdge);

        assert!(model.selected_effect_at_row_and_position(2, 1.5).is_none());
        assert!(model.selected_effect_at_row_and_position(4, 1.0).is_none());
        assert!(model.selected_effect_at_row_and_position(42, 1.0).is_none());

        let effect = model.element("Arch").unwrap().effect_layer(0).unwrap().effect(0).unwrap();
        assert_eq!(effect.selection, EffectSelection::NotSelected);
    }

    #[test]
    fn test_selected_ranges() {
        let mut model = SequenceModel::new();
        model.add_selected_range(EffectRange::new(0, 0.0, 1.0));
        model.add_selected_range(EffectRange::new(1, 0.5, 1.5));
        assert_eq!(model.selected_range_count(), 2);

        model.delete_selected_range(7);
        assert_eq!(model.selected_range_count(), 2);
        model.delete_selected_range(0);
        assert_eq!(model.selected_range(0).map(|r| r.row), Some(1));

        model.clear_selected_ranges();
        assert!(model.selected_ranges().is_empty());
    }

    #[test]
    fn test_manual_elements() {
        let mut model = SequenceModel::new();
        model.add_element("T", ElementType::Timing, true, false, true);
        model.add_element("T", ElementType::Model, true, false, false);
        assert_eq!(model.element_count(), 1);
        assert_eq!(model.row_count(), 1);
        assert_eq!(model.selected_timing_row(), Some(0));
        assert!(model.element_at(1).is_none());
    }
}
