use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw product payload as returned by the food database.
///
/// The tree is kept as an untyped `serde_json::Value` because every branch
/// (`nutrient_levels`, `nutriments`, `knowledge_panels`) is optional and the
/// shapes vary between schema versions. Accessors return `None` instead of
/// failing when a branch is missing or has the wrong shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub data: serde_json::Value,
}

impl ProductRecord {
    pub fn new(barcode: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            barcode: barcode.into(),
            data,
        }
    }

    fn object_branch(&self, key: &str) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.data.get(key).and_then(|v| v.as_object())
    }

    pub fn nutrient_levels(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.object_branch("nutrient_levels")
    }

    pub fn nutriments(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.object_branch("nutriments")
    }

    pub fn knowledge_panels(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.object_branch("knowledge_panels")
    }

    pub fn product_name(&self) -> Option<&str> {
        self.data
            .get("product_name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.trim().is_empty())
    }
}

/// The four nutrients that receive a traffic-light level, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NutrientKind {
    Fat,
    SaturatedFat,
    Sugars,
    Salt,
}

impl NutrientKind {
    pub const ALL: [NutrientKind; 4] = [
        NutrientKind::Fat,
        NutrientKind::SaturatedFat,
        NutrientKind::Sugars,
        NutrientKind::Salt,
    ];

    /// Key used in `nutrient_levels` and `nutriments`.
    pub fn key(self) -> &'static str {
        match self {
            NutrientKind::Fat => "fat",
            NutrientKind::SaturatedFat => "saturated-fat",
            NutrientKind::Sugars => "sugars",
            NutrientKind::Salt => "salt",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NutrientKind::Fat => "Fat",
            NutrientKind::SaturatedFat => "Saturated fat",
            NutrientKind::Sugars => "Sugars",
            NutrientKind::Salt => "Salt",
        }
    }
}

impl fmt::Display for NutrientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientLevel {
    Low,
    Moderate,
    High,
    Unknown,
}

impl NutrientLevel {
    /// Parses an upstream level label. Anything outside the three known
    /// labels maps to `Unknown`, never to `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => NutrientLevel::Low,
            "moderate" => NutrientLevel::Moderate,
            "high" => NutrientLevel::High,
            _ => NutrientLevel::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NutrientLevel::Low => "low",
            NutrientLevel::Moderate => "moderate",
            NutrientLevel::High => "high",
            NutrientLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NutrientLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientLevelEntry {
    pub nutrient: NutrientKind,
    pub level: NutrientLevel,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionFactRow {
    pub nutrient: String,
    pub value: String,
}

/// Diagnostic record of how an extraction arrived at its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub steps: Vec<String>,
    pub method_used: String,
    pub result_count: usize,
}

/// Everything derived from one product lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    pub barcode: String,
    pub product_name: Option<String>,
    pub levels: Vec<NutrientLevelEntry>,
    pub facts: Vec<NutritionFactRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_trace: Option<ExtractionTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts_trace: Option<ExtractionTrace>,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedLookup {
    pub barcode: String,
    pub message: String,
}

/// Result of a whole run: successful reports plus lookups that failed to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupReport {
    pub reports: Vec<ProductReport>,
    pub failures: Vec<FailedLookup>,
}
