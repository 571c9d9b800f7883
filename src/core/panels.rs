//! Read-only traversal of the `knowledge_panels` tree.
//!
//! Panels reference each other by id through `panel_group` elements. Every
//! accessor degrades to "no data" on a missing or oddly shaped node, so the
//! walker never fails; callers decide what an absent node means.

use crate::core::trace::TraceRecorder;
use crate::domain::model::{NutrientKind, NutrientLevel, NutrientLevelEntry, ProductRecord};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const NUTRIENT_LEVELS_PANEL: &str = "nutrient_levels";
pub const NUTRITION_FACTS_PANEL: &str = "nutrition_facts_table";

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("parenthesized group pattern"));

#[derive(Debug, Clone, Copy)]
pub struct KnowledgePanelWalker<'a> {
    panels: &'a Map<String, Value>,
}

impl<'a> KnowledgePanelWalker<'a> {
    pub fn new(panels: &'a Map<String, Value>) -> Self {
        Self { panels }
    }

    pub fn from_record(record: &'a ProductRecord) -> Option<Self> {
        record.knowledge_panels().map(Self::new)
    }

    pub fn panel(&self, id: &str) -> Option<Panel<'a>> {
        self.panels.get(id).and_then(Value::as_object).map(Panel::new)
    }

    /// Resolves the ids of a group into sibling panels, in reference order.
    /// Ids that do not name a panel are skipped and noted in the trace.
    pub fn resolve_group(
        &self,
        panel_ids: &[&'a str],
        trace: &mut TraceRecorder,
    ) -> Vec<(&'a str, Panel<'a>)> {
        panel_ids
            .iter()
            .filter_map(|id| match self.panel(id) {
                Some(panel) => Some((*id, panel)),
                None => {
                    trace.step(format!("Referenced panel '{}' not found, skipped", id));
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    node: &'a Map<String, Value>,
}

impl<'a> Panel<'a> {
    fn new(node: &'a Map<String, Value>) -> Self {
        Self { node }
    }

    fn title_field(&self, field: &str) -> Option<&'a str> {
        self.node
            .get("title_element")
            .and_then(|t| t.get(field))
            .and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&'a str> {
        self.title_field("title")
    }

    pub fn subtitle(&self) -> Option<&'a str> {
        self.title_field("subtitle")
    }

    pub fn evaluation(&self) -> Option<&'a str> {
        self.node.get("evaluation").and_then(Value::as_str)
    }

    pub fn elements(&self) -> Vec<PanelElement<'a>> {
        self.node
            .get("elements")
            .and_then(Value::as_array)
            .map(|elements| elements.iter().map(PanelElement::parse).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelElement<'a> {
    PanelGroup { panel_ids: Vec<&'a str> },
    Table { rows: Vec<Vec<&'a str>> },
    Other { element_type: String },
}

impl<'a> PanelElement<'a> {
    fn parse(node: &'a Value) -> Self {
        let element_type = node.get("element_type").and_then(Value::as_str);
        match element_type {
            Some("panel_group") => {
                let panel_ids = node
                    .get("panel_group_element")
                    .and_then(|g| g.get("panel_ids"))
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                PanelElement::PanelGroup { panel_ids }
            }
            Some("table") => {
                let rows = node
                    .get("table_element")
                    .and_then(|t| t.get("rows"))
                    .and_then(Value::as_array)
                    .map(|rows| rows.iter().map(row_cells).collect())
                    .unwrap_or_default();
                PanelElement::Table { rows }
            }
            other => PanelElement::Other {
                element_type: other.unwrap_or("<missing>").to_string(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            PanelElement::PanelGroup { .. } => "panel_group",
            PanelElement::Table { .. } => "table",
            PanelElement::Other { element_type } => element_type,
        }
    }
}

fn row_cells(row: &Value) -> Vec<&str> {
    row.get("values")
        .and_then(Value::as_array)
        .map(|cells| {
            cells
                .iter()
                .map(|cell| cell.get("text").and_then(Value::as_str).unwrap_or(""))
                .collect()
        })
        .unwrap_or_default()
}

/// Maps a panel title onto a nutrient. First match wins.
pub fn detect_nutrient(title: &str) -> Option<NutrientKind> {
    let title = title.to_lowercase();
    if title.contains("fat") && !title.contains("saturated") {
        Some(NutrientKind::Fat)
    } else if title.contains("saturated fat") {
        Some(NutrientKind::SaturatedFat)
    } else if title.contains("sugars") {
        Some(NutrientKind::Sugars)
    } else if title.contains("salt") {
        Some(NutrientKind::Salt)
    } else {
        None
    }
}

/// Subtitle wording takes priority over the panel's evaluation tag.
pub fn detect_level(subtitle: Option<&str>, evaluation: Option<&str>) -> NutrientLevel {
    let subtitle = subtitle.map(str::to_lowercase).unwrap_or_default();
    if subtitle.contains("low") {
        return NutrientLevel::Low;
    }
    if subtitle.contains("moderate") {
        return NutrientLevel::Moderate;
    }
    if subtitle.contains("high") {
        return NutrientLevel::High;
    }

    match evaluation {
        Some("good") => NutrientLevel::Low,
        Some("moderate") => NutrientLevel::Moderate,
        Some("bad") => NutrientLevel::High,
        _ => NutrientLevel::Unknown,
    }
}

/// First parenthesized group, e.g. `"(12%)"` gives `"12%"`.
pub fn extract_value(subtitle: Option<&str>) -> String {
    subtitle
        .and_then(|s| PARENTHESIZED.captures(s))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Reads a nutrient level out of a single nutrient panel, if its title names one.
pub fn parse_level_panel(panel: &Panel<'_>) -> Option<NutrientLevelEntry> {
    let nutrient = detect_nutrient(panel.title()?)?;
    Some(NutrientLevelEntry {
        nutrient,
        level: detect_level(panel.subtitle(), panel.evaluation()),
        value: extract_value(panel.subtitle()),
    })
}
