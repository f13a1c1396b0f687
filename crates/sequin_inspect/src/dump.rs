// SPDX-License-Identifier: MIT OR Apache-2.0
//! Row dumps for the inspector.

use sequin_sequencer::{RowKind, SequenceModel};
use serde::Serialize;
use std::fmt::Write as _;

/// One flattened row as printed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDump {
    pub index: usize,
    pub element: String,
    pub kind: &'static str,
    pub layer: usize,
    pub collapsed: bool,
    pub active: bool,
    pub color_index: usize,
    pub effects: usize,
    pub selected_timing: bool,
}

fn kind_name(kind: RowKind) -> &'static str {
    match kind {
        RowKind::Model => "model",
        RowKind::Timing => "timing",
        RowKind::ViewHeader => "view",
        RowKind::ViewMember { .. } => "member",
    }
}

/// Collect the current rows of `model`
pub fn collect_rows(model: &mut SequenceModel) -> Vec<RowDump> {
    let selected = model.selected_timing_row();
    let rows: Vec<_> = model.rows().rows().copied().collect();

    rows.into_iter()
        .filter_map(|row| {
            let element = model.store().element_by_id(row.element)?;
            let effects = element
                .effect_layer(row.layer_index)
                .map_or(0, |layer| layer.effect_count());
            Some(RowDump {
                index: row.index,
                element: element.name().to_string(),
                kind: kind_name(row.kind),
                layer: row.layer_index,
                collapsed: row.collapsed,
                active: row.active,
                color_index: row.color_index,
                effects,
                selected_timing: selected == Some(row.index),
            })
        })
        .collect()
}

/// Render rows as a plain text table
pub fn render_table(rows: &[RowDump]) -> String {
    let width = rows
        .iter()
        .map(|r| r.element.len())
        .max()
        .unwrap_or(0)
        .max("ELEMENT".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<width$}  {:<6}  {:>5}  {:>7}  FLAGS",
        "ROW", "ELEMENT", "KIND", "LAYER", "EFFECTS"
    );
    for row in rows {
        let mut flags = Vec::new();
        if row.collapsed {
            flags.push("collapsed".to_string());
        }
        if row.active {
            flags.push("active".to_string());
        }
        if row.kind == "timing" {
            flags.push(format!("color={}", row.color_index));
        }
        if row.selected_timing {
            flags.push("selected".to_string());
        }
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:<6}  {:>5}  {:>7}  {}",
            row.index,
            row.element,
            row.kind,
            row.layer,
            row.effects,
            flags.join(",")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequin_sequencer::{EffectTypeTable, TimingGrid, ViewRegistry};

    const DOC: &str = r#"<xsequence>
      <DisplayElements>
        <Element name="Beats" type="timing" visible="1" active="1"/>
        <Element name="Roofline" type="model" visible="1" collapsed="0"/>
        <Element name="Front" type="view" visible="1" collapsed="0"/>
      </DisplayElements>
      <ElementEffects>
        <Element name="Roofline">
          <EffectLayer>
            <Effect name="On" id="1" startTime="0" endTime="1"/>
            <Effect name="Off" id="2" startTime="1" endTime="2"/>
          </EffectLayer>
        </Element>
        <Element name="Bush"><EffectLayer/></Element>
      </ElementEffects>
    </xsequence>"#;

    fn model() -> SequenceModel {
        let mut views = ViewRegistry::new();
        views.add_view("Front", "Bush");
        let mut model = SequenceModel::with_views(views);
        model.load_sequence(DOC, TimingGrid::default(), &EffectTypeTable::default());
        model
    }

    #[test]
    fn test_collect_rows() {
        let mut model = model();
        let rows = collect_rows(&mut model);
        let summary: Vec<(&str, &str, usize)> = rows
            .iter()
            .map(|r| (r.element.as_str(), r.kind, r.effects))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Beats", "timing", 0),
                ("Roofline", "model", 2),
                ("Front", "view", 0),
                ("Bush", "member", 0),
            ]
        );
        assert!(rows[0].selected_timing);
        assert!(!rows[1].selected_timing);
    }

    #[test]
    fn test_render_table() {
        let mut model = model();
        let table = render_table(&collect_rows(&mut model));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with(" ROW  ELEMENT"));
        assert!(lines[1].contains("Beats"));
        assert!(lines[1].ends_with("active,color=0,selected"));
        assert!(lines[2].contains("Roofline"));
    }

    #[test]
    fn test_json_rows() {
        let mut model = model();
        let json = serde_json::to_value(collect_rows(&mut model)).unwrap();
        assert_eq!(json[1]["element"], "Roofline");
        assert_eq!(json[3]["kind"], "member");
    }
}
