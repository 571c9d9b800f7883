use crate::core::panels::{KnowledgePanelWalker, PanelElement, NUTRITION_FACTS_PANEL};
use crate::core::strategy::{BoxedStrategy, StrategyChain};
use crate::core::thresholds::{display_amount, present};
use crate::core::trace::TraceRecorder;
use crate::domain::model::{ExtractionTrace, NutritionFactRow, ProductRecord};
use crate::domain::ports::ExtractionStrategy;

pub const PANEL_TABLE: &str = "Knowledge Panel Table";
pub const NUTRIMENT_FALLBACK: &str = "Nutriment Fallback";

const ENERGY_LABEL: &str = "Energy";

/// Fallback rows in display order: (label, nutriment key, unit).
const FALLBACK_ROWS: [(&str, &str, &str); 8] = [
    (ENERGY_LABEL, "energy-kcal", "kcal"),
    ("Fat", "fat", "g"),
    ("Saturated fat", "saturated-fat", "g"),
    ("Carbohydrates", "carbohydrates", "g"),
    ("Sugars", "sugars", "g"),
    ("Fiber", "fiber", "g"),
    ("Proteins", "proteins", "g"),
    ("Salt", "salt", "g"),
];

pub struct PanelTableStrategy;

impl ExtractionStrategy for PanelTableStrategy {
    type Output = NutritionFactRow;

    fn label(&self) -> &'static str {
        PANEL_TABLE
    }

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder) -> Option<Vec<NutritionFactRow>> {
        let Some(walker) = KnowledgePanelWalker::from_record(record) else {
            trace.step("knowledge_panels not present");
            return None;
        };
        let Some(panel) = walker.panel(NUTRITION_FACTS_PANEL) else {
            trace.step(format!("{} panel not found", NUTRITION_FACTS_PANEL));
            return None;
        };

        // Only the first element is considered.
        let elements = panel.elements();
        let rows = match elements.first() {
            None => {
                trace.step(format!("{} panel has no elements", NUTRITION_FACTS_PANEL));
                return Some(Vec::new());
            }
            Some(PanelElement::Table { rows }) => rows,
            Some(other) => {
                trace.step(format!("First element is '{}', not a table", other.type_name()));
                return Some(Vec::new());
            }
        };
        trace.step(format!("Table has {} row(s)", rows.len()));

        let mut facts = Vec::new();
        for (index, cells) in rows.iter().enumerate() {
            if cells.len() < 2 {
                trace.step(format!("Row {} has {} cell(s), skipped", index, cells.len()));
                continue;
            }
            facts.push(NutritionFactRow {
                nutrient: cells[0].to_string(),
                value: cells[1].to_string(),
            });
        }

        Some(facts)
    }
}

pub struct NutrimentFallbackStrategy;

impl ExtractionStrategy for NutrimentFallbackStrategy {
    type Output = NutritionFactRow;

    fn label(&self) -> &'static str {
        NUTRIMENT_FALLBACK
    }

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder) -> Option<Vec<NutritionFactRow>> {
        let Some(nutriments) = record.nutriments() else {
            trace.step("nutriments not present");
            return None;
        };

        let mut facts: Vec<NutritionFactRow> = FALLBACK_ROWS
            .iter()
            .filter_map(|(label, key, unit)| {
                present(nutriments, key).map(|amount| NutritionFactRow {
                    nutrient: label.to_string(),
                    value: format!("{} {}", display_amount(amount), unit),
                })
            })
            .collect();
        trace.step(format!("Mapped {} nutriment(s)", facts.len()));

        if let (Some(kj), Some(kcal)) = (present(nutriments, "energy-kj"), present(nutriments, "energy-kcal")) {
            if let Some(energy) = facts.iter_mut().find(|f| f.nutrient == ENERGY_LABEL) {
                energy.value = format!("{} kj\n({} kcal)", display_amount(kj), display_amount(kcal));
                trace.step("Merged energy-kj into Energy row");
            }
        }

        Some(facts)
    }
}

pub struct FactsExtractionPipeline {
    chain: StrategyChain<NutritionFactRow>,
}

impl FactsExtractionPipeline {
    pub fn new() -> Self {
        Self {
            chain: StrategyChain::new(vec![
                Box::new(PanelTableStrategy) as BoxedStrategy<NutritionFactRow>,
                Box::new(NutrimentFallbackStrategy) as BoxedStrategy<NutritionFactRow>,
            ]),
        }
    }

    pub fn strategy_labels(&self) -> Vec<&'static str> {
        self.chain.labels()
    }

    pub fn extract(&self, record: &ProductRecord) -> (Vec<NutritionFactRow>, ExtractionTrace) {
        let (facts, trace) = self.chain.run(record);
        tracing::debug!(
            "facts for {}: {} row(s) via {}",
            record.barcode,
            facts.len(),
            trace.method_used
        );
        (facts, trace)
    }
}

impl Default for FactsExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_facts(record: &ProductRecord) -> (Vec<NutritionFactRow>, ExtractionTrace) {
    FactsExtractionPipeline::new().extract(record)
}
