// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence document loading.
//!
//! A sequence document has two sections:
//!
//! ```xml
//! <xsequence>
//!   <DisplayElements>
//!     <Element name="Beats" type="timing" visible="1" active="1"/>
//!     <Element name="Arch" type="model" visible="1" collapsed="0"/>
//!   </DisplayElements>
//!   <ElementEffects>
//!     <Element name="Arch" type="model">
//!       <EffectLayer>
//!         <Effect name="On" id="3" startTime="0.5" endTime="1.0" protected="0">settings</Effect>
//!       </EffectLayer>
//!     </Element>
//!   </ElementEffects>
//! </xsequence>
//! ```
//!
//! Loading is best-effort: bad attributes fall back to defaults, unknown nodes
//! are skipped, and a syntax error ends the parse but keeps everything read
//! so far. Problems are reported as [`LoadWarning`]s, never as errors.

use crate::effect::{EffectSelection, EffectTypeLookup};
use crate::element::{ElementId, ElementType};
use crate::grid::TimingGrid;
use crate::rows::RowList;
use crate::store::ElementStore;
use crate::view::ViewRegistry;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Non-fatal problem found while loading
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    /// Declaration without a name
    #[error("Element declaration without a name skipped")]
    MissingName,

    /// Declaration with a missing or unknown type
    #[error("Element {element:?} has unknown type {value:?}, loaded as a model")]
    UnknownElementType {
        /// Element name
        element: String,
        /// Type attribute as found
        value: String,
    },

    /// Element declared more than once
    #[error("Element {0:?} declared more than once")]
    DuplicateElement(String),

    /// Effects listed for an element that was never declared
    #[error("Effects for undeclared element {0:?} skipped")]
    UndeclaredElement(String),

    /// Effect type name not known to the type lookup
    #[error("Unknown effect type {effect:?} on element {element:?}")]
    UnknownEffectType {
        /// Element name
        element: String,
        /// Effect type name
        effect: String,
    },

    /// Attribute that should be numeric but is not
    #[error("Invalid {attribute} {value:?} on element {element:?}, using 0")]
    InvalidNumber {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
        /// Attribute value as found
        value: String,
    },

    /// XML syntax error; parsing stopped here
    #[error("XML error at byte {position}: {message}")]
    Xml {
        /// Byte offset in the document
        position: u64,
        /// Parser message
        message: String,
    },
}

/// Summary of a load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Elements in the store after loading
    pub elements: usize,
    /// Model elements created for view members
    pub materialized_members: usize,
    /// Effects added
    pub effects: usize,
    /// Non-fatal problems
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Whether the document loaded without any warning
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Error reading a sequence file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("Failed to read sequence file: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads sequence documents into an [`ElementStore`]
pub struct SequenceLoader<'a> {
    grid: TimingGrid,
    effect_types: &'a dyn EffectTypeLookup,
}

impl<'a> SequenceLoader<'a> {
    /// Create a loader snapping times to `grid` and resolving effect types through `effect_types`
    pub fn new(grid: TimingGrid, effect_types: &'a dyn EffectTypeLookup) -> Self {
        Self { grid, effect_types }
    }

    /// Timing grid used for snapping
    pub fn grid(&self) -> TimingGrid {
        self.grid
    }

    /// Load a sequence file. Only I/O failures are errors.
    pub fn load_file(
        &self,
        path: &Path,
        store: &mut ElementStore,
        views: &ViewRegistry,
    ) -> Result<(RowList, LoadReport), LoadError> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Loading sequence {:?}", path);
        Ok(self.load_str(&content, store, views))
    }

    /// Replace the contents of `store` with the document and flatten it into rows
    pub fn load_str(
        &self,
        xml: &str,
        store: &mut ElementStore,
        views: &ViewRegistry,
    ) -> (RowList, LoadReport) {
        store.clear();
        let mut state = LoadState {
            loader: self,
            store,
            views,
            section: Section::None,
            element: None,
            layer: None,
            effect: None,
            materialized: HashSet::new(),
            report: LoadReport::default(),
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(ref e)) => state.open(e, false),
                Ok(Event::Empty(ref e)) => state.open(e, true),
                Ok(Event::End(ref e)) => state.close(e.name().as_ref()),
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().unwrap_or_default();
                    state.text(&text);
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e).into_owned();
                    state.text(&text);
                }
                Err(e) => {
                    state.warn(LoadWarning::Xml {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    });
                    break;
                }
                _ => {}
            }
        }

        let LoadState { store, mut report, .. } = state;
        report.elements = store.element_count();
        let rows = RowList::flatten(store, views);

        tracing::debug!(
            "Loaded sequence: {} elements ({} from views), {} effects, {} rows, {} warnings",
            report.elements,
            report.materialized_members,
            report.effects,
            rows.len(),
            report.warnings.len()
        );

        (rows, report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Display,
    Effects,
}

/// Element whose effects are being read
struct CurrentElement {
    id: ElementId,
    name: String,
    timing: bool,
}

/// Effect collected until its closing tag
struct PendingEffect {
    id: i32,
    effect_type_index: Option<usize>,
    name: String,
    settings: String,
    start_time: f64,
    end_time: f64,
    protected: bool,
}

struct LoadState<'l, 's> {
    loader: &'l SequenceLoader<'l>,
    store: &'s mut ElementStore,
    views: &'s ViewRegistry,
    section: Section,
    element: Option<CurrentElement>,
    layer: Option<usize>,
    effect: Option<PendingEffect>,
    /// View members created implicitly and not declared yet
    materialized: HashSet<String>,
    report: LoadReport,
}

impl LoadState<'_, '_> {
    fn warn(&mut self, warning: LoadWarning) {
        tracing::warn!("Sequence load: {}", warning);
        self.report.warnings.push(warning);
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match (self.section, e.name().as_ref()) {
            (Section::None, b"DisplayElements") if !empty => self.section = Section::Display,
            (Section::None, b"ElementEffects") if !empty => self.section = Section::Effects,
            (Section::Display, b"Element") => self.declare(&Attributes::read(e)),
            (Section::Effects, b"Element") => {
                self.begin_element(&Attributes::read(e));
                if empty {
                    self.element = None;
                }
            }
            (Section::Effects, b"EffectLayer") => {
                self.begin_layer();
                if empty {
                    self.layer = None;
                }
            }
            (Section::Effects, b"Effect") => {
                self.begin_effect(&Attributes::read(e));
                if empty {
                    self.finish_effect();
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match (self.section, name) {
            (Section::Display, b"DisplayElements") | (Section::Effects, b"ElementEffects") => {
                self.section = Section::None;
            }
            (Section::Effects, b"Element") => {
                self.element = None;
                self.layer = None;
            }
            (Section::Effects, b"EffectLayer") => self.layer = None,
            (Section::Effects, b"Effect") => self.finish_effect(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.element.as_ref().is_some_and(|e| e.timing) {
            return;
        }
        if let Some(effect) = self.effect.as_mut() {
            effect.settings.push_str(text);
        }
    }

    fn declare(&mut self, attrs: &Attributes) {
        let name = attrs.get("name").unwrap_or_default().to_string();
        if name.is_empty() {
            self.warn(LoadWarning::MissingName);
            return;
        }

        let type_name = attrs.get("type").unwrap_or_default();
        let element_type = match type_name.parse::<ElementType>() {
            Ok(element_type) => element_type,
            Err(_) => {
                self.warn(LoadWarning::UnknownElementType {
                    element: name.clone(),
                    value: type_name.to_string(),
                });
                ElementType::Model
            }
        };

        let visible = attrs.flag("visible");
        let (collapsed, active) = match element_type {
            ElementType::Timing => (false, attrs.flag("active")),
            ElementType::Model | ElementType::View => (attrs.flag("collapsed"), false),
        };

        if self.materialized.remove(&name) {
            // A view member declared in its own right takes the declared flags
            if let Some(element) = self.store.element_mut(&name) {
                element.element_type = element_type;
                element.visible = visible;
                element.collapsed = collapsed;
                element.active = active;
            }
        } else if self.store.element_exists(&name) {
            self.warn(LoadWarning::DuplicateElement(name.clone()));
        } else {
            self.store
                .add_element(name.as_str(), element_type, visible, collapsed, active);
        }
        tracing::trace!("Declared {} {:?}", element_type, name);

        if element_type == ElementType::View {
            for member in self.views.view_members(&name) {
                if !self.store.element_exists(member) {
                    self.store
                        .add_element(member, ElementType::Model, false, false, false);
                    self.materialized.insert(member.to_string());
                    self.report.materialized_members += 1;
                }
            }
        }
    }

    fn begin_element(&mut self, attrs: &Attributes) {
        self.layer = None;
        let name = attrs.get("name").unwrap_or_default();
        let Some(element) = self.store.element(name) else {
            self.element = None;
            self.warn(LoadWarning::UndeclaredElement(name.to_string()));
            return;
        };

        let timing = match attrs.get("type") {
            Some(type_name) => type_name == ElementType::Timing.as_str(),
            None => element.is_timing(),
        };
        self.element = Some(CurrentElement {
            id: element.id(),
            name: element.name().to_string(),
            timing,
        });
    }

    fn begin_layer(&mut self) {
        let Some(current) = self.element.as_ref() else {
            return;
        };
        self.layer = self.store.element_by_id_mut(current.id).map(|element| {
            element.add_effect_layer();
            element.effect_layer_count() - 1
        });
    }

    fn begin_effect(&mut self, attrs: &Attributes) {
        let Some(current) = self.element.as_ref() else {
            return;
        };
        if self.layer.is_none() {
            return;
        }
        let element_name = current.name.clone();
        let timing = current.timing;

        let grid = self.loader.grid;
        let start_time = grid.snap(self.time(attrs, "startTime", &element_name));
        let end_time = grid.snap(self.time(attrs, "endTime", &element_name));
        let protected = attrs.flag("protected");

        let mut effect = PendingEffect {
            id: 0,
            effect_type_index: None,
            name: String::new(),
            settings: String::new(),
            start_time,
            end_time,
            protected,
        };

        // Timing marks only carry their bounds
        if !timing {
            effect.name = attrs.get("name").unwrap_or_default().to_string();
            effect.id = self.number(attrs, "id", &element_name);
            effect.effect_type_index = self.loader.effect_types.effect_index(&effect.name);
            if effect.effect_type_index.is_none() {
                self.warn(LoadWarning::UnknownEffectType {
                    element: element_name,
                    effect: effect.name.clone(),
                });
            }
        }

        self.effect = Some(effect);
    }

    fn finish_effect(&mut self) {
        let Some(effect) = self.effect.take() else {
            return;
        };
        let (Some(current), Some(layer_index)) = (self.element.as_ref(), self.layer) else {
            return;
        };

        if let Some(layer) = self.store.effect_layer_mut(current.id, layer_index) {
            layer.add_effect(
                effect.id,
                effect.effect_type_index,
                effect.name,
                effect.settings,
                effect.start_time,
                effect.end_time,
                EffectSelection::NotSelected,
                effect.protected,
            );
            self.report.effects += 1;
        }
    }

    /// Parse a numeric attribute; missing is zero, malformed is zero plus a warning
    fn number<T: FromStr + Default>(&mut self, attrs: &Attributes, key: &str, element: &str) -> T {
        self.parse_with(attrs, key, element, |value| value.parse().ok())
    }

    /// Parse a time attribute like [`Self::number`], also rejecting NaN and infinities
    fn time(&mut self, attrs: &Attributes, key: &str, element: &str) -> f64 {
        self.parse_with(attrs, key, element, |value| {
            value.parse::<f64>().ok().filter(|time| time.is_finite())
        })
    }

    fn parse_with<T: Default>(
        &mut self,
        attrs: &Attributes,
        key: &str,
        element: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        let Some(value) = attrs.get(key) else {
            return T::default();
        };
        match parse(value.trim()) {
            Some(number) => number,
            None => {
                self.warn(LoadWarning::InvalidNumber {
                    element: element.to_string(),
                    attribute: key.to_string(),
                    value: value.to_string(),
                });
                T::default()
            }
        }
    }
}

/// Unescaped attributes of one node; malformed attributes are dropped
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn read(e: &BytesStart<'_>) -> Self {
        Self(
            e.attributes()
                .flatten()
                .map(|attr| {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    (key, value)
                })
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("1" | "true"))
    }
}
