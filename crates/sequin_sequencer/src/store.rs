// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered element storage.

use crate::element::{Element, ElementId, ElementType};
use crate::layer::EffectLayer;
use indexmap::IndexMap;

/// Owns the elements of a sequence in display order.
///
/// Every mutation that can change the row layout bumps [`revision`](Self::revision),
/// which lets row lists detect that they were built from an older state.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: IndexMap<ElementId, Element>,
    revision: u64,
}

impl ElementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Current revision, bumped on every layout-affecting mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add an element unless one with the same name already exists.
    ///
    /// Returns the handle of the new element, or of the existing one.
    pub fn add_element(
        &mut self,
        name: impl Into<String>,
        element_type: ElementType,
        visible: bool,
        collapsed: bool,
        active: bool,
    ) -> ElementId {
        let name = name.into();
        if let Some(existing) = self.element(&name) {
            return existing.id();
        }

        let mut element = Element::new(name, element_type, visible, collapsed, active);
        element.index = self.elements.len();
        let id = element.id();
        self.elements.insert(id, element);
        self.touch();
        id
    }

    /// Get element count
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Is the store empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check whether an element with this name exists
    pub fn element_exists(&self, name: &str) -> bool {
        self.element(name).is_some()
    }

    /// Get an element by name
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.values().find(|e| e.name() == name)
    }

    /// Get a mutable element by name
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        let element = self.elements.values_mut().find(|e| e.name() == name)?;
        self.revision = self.revision.wrapping_add(1);
        Some(element)
    }

    /// Get an element by display position
    pub fn element_at(&self, position: usize) -> Option<&Element> {
        self.elements.get_index(position).map(|(_, e)| e)
    }

    /// Get a mutable element by display position
    pub fn element_at_mut(&mut self, position: usize) -> Option<&mut Element> {
        let (_, element) = self.elements.get_index_mut(position)?;
        self.revision = self.revision.wrapping_add(1);
        Some(element)
    }

    /// Resolve a handle
    pub fn element_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Resolve a handle mutably
    pub fn element_by_id_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let element = self.elements.get_mut(&id)?;
        self.revision = self.revision.wrapping_add(1);
        Some(element)
    }

    /// Mutable access to one effect layer.
    ///
    /// Effect edits do not change the row layout, so the revision is kept.
    pub fn effect_layer_mut(
        &mut self,
        id: ElementId,
        layer_index: usize,
    ) -> Option<&mut EffectLayer> {
        self.elements.get_mut(&id)?.effect_layer_mut(layer_index)
    }

    /// Display position of the element called `name`
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.elements.values().position(|e| e.name() == name)
    }

    /// Get all elements in display order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Remove every element called `name`, returning how many were removed
    pub fn delete_element(&mut self, name: &str) -> usize {
        let before = self.elements.len();
        self.elements.retain(|_, e| e.name() != name);
        let removed = before - self.elements.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Rename an element. Fails if `new_name` is already taken.
    pub fn rename_element(&mut self, name: &str, new_name: impl Into<String>) -> bool {
        let new_name = new_name.into();
        if self.element_exists(&new_name) {
            return false;
        }
        match self.element_mut(name) {
            Some(element) => {
                element.set_name(new_name);
                true
            }
            None => false,
        }
    }

    fn update(&mut self, name: &str, f: impl FnOnce(&mut Element)) -> bool {
        self.element_mut(name).map(f).is_some()
    }

    /// Set the visible flag of an element
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        self.update(name, |e| e.visible = visible)
    }

    /// Set the collapsed flag of an element
    pub fn set_collapsed(&mut self, name: &str, collapsed: bool) -> bool {
        self.update(name, |e| e.collapsed = collapsed)
    }

    /// Set the active flag of an element
    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        self.update(name, |e| e.active = active)
    }

    /// Clear the active flag of every timing element
    pub fn deactivate_all_timing_elements(&mut self) {
        for element in self.elements.values_mut().filter(|e| e.is_timing()) {
            element.active = false;
        }
        self.touch();
    }

    /// Remove all elements
    pub fn clear(&mut self) {
        self.elements.clear();
        self.touch();
    }

    /// Move the element at `index` so that it lands in front of the element
    /// currently at `destination` (`destination == len` moves it to the end).
    ///
    /// Every element strictly between the two positions shifts by one toward
    /// the vacated slot. Returns `false` without changes for out-of-range
    /// positions or when `index == destination`.
    pub fn move_element(&mut self, index: usize, destination: usize) -> bool {
        let len = self.elements.len();
        if index >= len || destination > len || index == destination {
            return false;
        }

        self.renumber();
        if index < destination {
            for position in index + 1..destination {
                if let Some((_, element)) = self.elements.get_index_mut(position) {
                    element.index -= 1;
                }
            }
        } else {
            for position in destination..index {
                if let Some((_, element)) = self.elements.get_index_mut(position) {
                    element.index += 1;
                }
            }
        }
        if let Some((_, moved)) = self.elements.get_index_mut(index) {
            moved.index = destination;
        }

        self.sort_elements();
        self.touch();
        true
    }

    /// Stable sort by order key
    pub fn sort_elements(&mut self) {
        if self.elements.len() < 2 {
            return;
        }
        self.elements.sort_by(|_, a, _, b| a.index.cmp(&b.index));
        self.touch();
    }

    /// Reset every order key to the element's current position
    fn renumber(&mut self) {
        for (position, element) in self.elements.values_mut().enumerate() {
            element.index = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> ElementStore {
        let mut store = ElementStore::new();
        for name in names {
            store.add_element(*name, ElementType::Model, true, false, false);
        }
        store
    }

    fn names(store: &ElementStore) -> Vec<&str> {
        store.elements().map(|e| e.name()).collect()
    }

    #[test]
    fn test_add_is_idempotent_by_name() {
        let mut store = ElementStore::new();
        let first = store.add_element("Arch", ElementType::Model, true, false, false);
        let second = store.add_element("Arch", ElementType::Timing, false, true, true);

        assert_eq!(first, second);
        assert_eq!(store.element_count(), 1);
        let arch = store.element("Arch").unwrap();
        assert_eq!(arch.element_type, ElementType::Model);
        assert!(arch.visible);
    }

    #[test]
    fn test_lookup() {
        let store = store_with(&["A", "B"]);
        assert!(store.element_exists("B"));
        assert!(!store.element_exists("C"));
        assert_eq!(store.element_at(1).map(|e| e.name()), Some("B"));
        assert!(store.element_at(2).is_none());
        assert_eq!(store.position_of("B"), Some(1));
        assert_eq!(store.element_at(1).map(|e| e.index), Some(1));
    }

    #[test]
    fn test_delete_element() {
        let mut store = store_with(&["A", "B", "C"]);
        let id = store.element("B").unwrap().id();

        assert_eq!(store.delete_element("B"), 1);
        assert!(!store.element_exists("B"));
        assert!(store.element_by_id(id).is_none());
        assert_eq!(names(&store), vec!["A", "C"]);
        assert_eq!(store.delete_element("B"), 0);
    }

    #[test]
    fn test_move_forward() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        assert!(store.move_element(1, 3));

        let index_of = |name: &str| store.element(name).unwrap().index;
        assert_eq!(index_of("B"), 3);
        assert_eq!(index_of("C"), 1);
        assert_eq!(index_of("D"), 3);
        assert_eq!(names(&store), vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_move_to_end() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        assert!(store.move_element(0, 4));
        assert_eq!(names(&store), vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_move_backward() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        assert!(store.move_element(3, 1));
        assert_eq!(names(&store), vec!["A", "D", "B", "C"]);

        // Keys are renumbered before each move, so moves compose
        assert!(store.move_element(0, 2));
        assert_eq!(names(&store), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn test_move_rejects_bad_positions() {
        let mut store = store_with(&["A", "B"]);
        assert!(!store.move_element(2, 0));
        assert!(!store.move_element(0, 3));
        assert!(!store.move_element(1, 1));
        assert_eq!(names(&store), vec!["A", "B"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut store = store_with(&["A", "B", "C"]);
        for name in ["A", "B", "C"] {
            store.element_mut(name).unwrap().index = 5;
        }
        store.element_mut("C").unwrap().index = 0;
        store.sort_elements();
        assert_eq!(names(&store), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_rename() {
        let mut store = store_with(&["A", "B"]);
        assert!(!store.rename_element("A", "B"));
        assert!(store.rename_element("A", "Z"));
        assert!(store.element_exists("Z"));
        assert!(!store.rename_element("missing", "Q"));
    }

    #[test]
    fn test_flag_changes_bump_revision() {
        let mut store = store_with(&["A"]);
        let revision = store.revision();
        assert!(store.set_collapsed("A", true));
        assert!(store.revision() > revision);

        let revision = store.revision();
        assert!(!store.set_visible("missing", false));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_names_change_only_through_rename() {
        let mut store = store_with(&["A", "B"]);
        let id = store.element("A").unwrap().id();

        // In-place edits reach flags and layers but not the name or handle
        let element = store.element_mut("A").unwrap();
        element.visible = false;
        element.add_effect_layer();
        assert_eq!(element.name(), "A");
        assert_eq!(element.id(), id);

        assert!(!store.rename_element("A", "B"));
        assert_eq!(names(&store), vec!["A", "B"]);
        assert!(store.rename_element("A", "C"));
        assert_eq!(names(&store), vec!["C", "B"]);
        assert_eq!(store.element_by_id(id).map(|e| e.name()), Some("C"));
        assert!(!store.element("C").unwrap().visible);
    }

    #[test]
    fn test_effect_edits_keep_revision() {
        let mut store = store_with(&["A"]);
        let id = store.element_mut("A").unwrap().id();
        store.element_mut("A").unwrap().add_effect_layer();

        let revision = store.revision();
        assert!(store.effect_layer_mut(id, 0).is_some());
        assert!(store.effect_layer_mut(id, 1).is_none());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_deactivate_all_timing() {
        let mut store = ElementStore::new();
        store.add_element("T1", ElementType::Timing, true, false, true);
        store.add_element("T2", ElementType::Timing, true, false, true);
        store.add_element("M", ElementType::Model, true, false, true);

        store.deactivate_all_timing_elements();
        assert!(store.elements().filter(|e| e.is_timing()).all(|e| !e.active));
        assert!(store.element("M").unwrap().active);
    }
}
