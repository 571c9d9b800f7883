//! Nutrient level extraction.
//!
//! Three strategies are tried in order: the product's own `nutrient_levels`
//! map, the `nutrient_levels` knowledge panel, and finally classification of
//! the raw `nutriments` amounts against the fixed per-100g cut points.

use crate::core::panels::{self, KnowledgePanelWalker, PanelElement, NUTRIENT_LEVELS_PANEL};
use crate::core::strategy::{BoxedStrategy, StrategyChain};
use crate::core::thresholds::{classify, display_amount, numeric_amount, present, sodium_to_salt};
use crate::core::trace::TraceRecorder;
use crate::domain::model::{ExtractionTrace, NutrientKind, NutrientLevel, NutrientLevelEntry, ProductRecord};
use crate::domain::ports::ExtractionStrategy;
use serde_json::{Map, Value};

pub const DIRECT_FIELD: &str = "Direct Field";
pub const KNOWLEDGE_PANEL: &str = "Knowledge Panel";
pub const NUTRIMENT_THRESHOLD: &str = "Nutriment Threshold";

/// Display value for a nutriment: the `_100g` figure as a percentage in
/// parentheses when present, otherwise amount and unit (default `g`).
fn nutriment_value(nutriments: Option<&Map<String, Value>>, key: &str) -> String {
    let Some(nutriments) = nutriments else {
        return String::new();
    };

    if let Some(per_100g) = present(nutriments, &format!("{}_100g", key)) {
        return format!("({}%)", display_amount(per_100g));
    }

    if let Some(amount) = present(nutriments, key) {
        let unit = nutriments
            .get(&format!("{}_unit", key))
            .and_then(Value::as_str)
            .unwrap_or("g");
        return format!("{}{}", display_amount(amount), unit);
    }

    String::new()
}

pub struct DirectFieldStrategy;

impl ExtractionStrategy for DirectFieldStrategy {
    type Output = NutrientLevelEntry;

    fn label(&self) -> &'static str {
        DIRECT_FIELD
    }

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder) -> Option<Vec<NutrientLevelEntry>> {
        let Some(levels) = record.nutrient_levels() else {
            trace.step("nutrient_levels field not present");
            return None;
        };
        trace.step(format!("nutrient_levels field present with {} key(s)", levels.len()));

        let nutriments = record.nutriments();
        let mut entries = Vec::new();
        for kind in NutrientKind::ALL {
            let Some(label) = levels.get(kind.key()) else {
                trace.step(format!("No level given for {}", kind.key()));
                continue;
            };

            let level = label
                .as_str()
                .map(NutrientLevel::from_label)
                .unwrap_or(NutrientLevel::Unknown);
            entries.push(NutrientLevelEntry {
                nutrient: kind,
                level,
                value: nutriment_value(nutriments, kind.key()),
            });
        }

        Some(entries)
    }
}

pub struct KnowledgePanelStrategy;

impl ExtractionStrategy for KnowledgePanelStrategy {
    type Output = NutrientLevelEntry;

    fn label(&self) -> &'static str {
        KNOWLEDGE_PANEL
    }

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder) -> Option<Vec<NutrientLevelEntry>> {
        let Some(walker) = KnowledgePanelWalker::from_record(record) else {
            trace.step("knowledge_panels not present");
            return None;
        };
        let Some(panel) = walker.panel(NUTRIENT_LEVELS_PANEL) else {
            trace.step(format!("{} panel not found", NUTRIENT_LEVELS_PANEL));
            return None;
        };

        let elements = panel.elements();
        trace.step(format!("{} panel has {} element(s)", NUTRIENT_LEVELS_PANEL, elements.len()));

        let mut entries: Vec<NutrientLevelEntry> = Vec::new();
        for element in &elements {
            let PanelElement::PanelGroup { panel_ids } = element else {
                trace.step(format!("Skipping element of type '{}'", element.type_name()));
                continue;
            };

            for (id, nutrient_panel) in walker.resolve_group(panel_ids, trace) {
                let Some(entry) = panels::parse_level_panel(&nutrient_panel) else {
                    trace.step(format!("Panel '{}' does not name a nutrient, skipped", id));
                    continue;
                };

                if entries.iter().any(|e| e.nutrient == entry.nutrient) {
                    trace.step(format!("Duplicate {} panel '{}' dropped", entry.nutrient, id));
                    continue;
                }

                trace.step(format!("Panel '{}': {} is {}", id, entry.nutrient, entry.level));
                entries.push(entry);
            }
        }

        // Output order is fixed regardless of panel order.
        entries.sort_by_key(|e| NutrientKind::ALL.iter().position(|k| *k == e.nutrient));
        Some(entries)
    }
}

pub struct NutrimentThresholdStrategy;

impl ExtractionStrategy for NutrimentThresholdStrategy {
    type Output = NutrientLevelEntry;

    fn label(&self) -> &'static str {
        NUTRIMENT_THRESHOLD
    }

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder) -> Option<Vec<NutrientLevelEntry>> {
        let Some(nutriments) = record.nutriments() else {
            trace.step("nutriments not present");
            return None;
        };

        let mut entries = Vec::new();
        for kind in NutrientKind::ALL {
            let Some(raw) = nutriments.get(kind.key()) else {
                continue;
            };

            let level = classify(kind, numeric_amount(raw));
            trace.step(format!("Classified {} amount {} as {}", kind.key(), raw, level));
            entries.push(NutrientLevelEntry {
                nutrient: kind,
                level,
                value: nutriment_value(Some(nutriments), kind.key()),
            });
        }

        if !entries.iter().any(|e| e.nutrient == NutrientKind::Salt) {
            if let Some(sodium) = nutriments.get("sodium") {
                match numeric_amount(sodium) {
                    Some(sodium) => {
                        let salt = sodium_to_salt(sodium);
                        let level = classify(NutrientKind::Salt, Some(salt));
                        trace.step(format!("Derived salt {:.3}g from sodium {}g: {}", salt, sodium, level));
                        entries.push(NutrientLevelEntry {
                            nutrient: NutrientKind::Salt,
                            level,
                            value: format!("{:.3}g", salt),
                        });
                    }
                    None => trace.step(format!("Sodium value {} is not numeric, salt not derived", sodium)),
                }
            }
        }

        Some(entries)
    }
}

pub struct LevelExtractionPipeline {
    chain: StrategyChain<NutrientLevelEntry>,
}

impl LevelExtractionPipeline {
    pub fn new() -> Self {
        Self {
            chain: StrategyChain::new(vec![
                Box::new(DirectFieldStrategy) as BoxedStrategy<NutrientLevelEntry>,
                Box::new(KnowledgePanelStrategy) as BoxedStrategy<NutrientLevelEntry>,
                Box::new(NutrimentThresholdStrategy) as BoxedStrategy<NutrientLevelEntry>,
            ]),
        }
    }

    pub fn strategy_labels(&self) -> Vec<&'static str> {
        self.chain.labels()
    }

    pub fn extract(&self, record: &ProductRecord) -> (Vec<NutrientLevelEntry>, ExtractionTrace) {
        let (entries, trace) = self.chain.run(record);
        tracing::debug!(
            "levels for {}: {} entr(ies) via {}",
            record.barcode,
            entries.len(),
            trace.method_used
        );
        (entries, trace)
    }
}

impl Default for LevelExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_levels(record: &ProductRecord) -> (Vec<NutrientLevelEntry>, ExtractionTrace) {
    LevelExtractionPipeline::new().extract(record)
}
