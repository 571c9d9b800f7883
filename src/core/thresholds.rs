use crate::domain::model::{NutrientKind, NutrientLevel};
use serde_json::{Map, Value};

/// Per-100g cut points `(low_below, moderate_below)` for each nutrient.
/// Values are the fixed traffic-light reference amounts in grams.
fn cut_points(kind: NutrientKind) -> (f64, f64) {
    match kind {
        NutrientKind::Fat => (3.0, 20.0),
        NutrientKind::SaturatedFat => (1.5, 5.0),
        NutrientKind::Sugars => (5.0, 12.5),
        NutrientKind::Salt => (0.3, 1.5),
    }
}

/// Classifies a per-100g amount. Missing or non-finite amounts are `Unknown`.
pub fn classify(kind: NutrientKind, amount: Option<f64>) -> NutrientLevel {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return NutrientLevel::Unknown;
    };

    let (low_below, moderate_below) = cut_points(kind);
    if amount < low_below {
        NutrientLevel::Low
    } else if amount < moderate_below {
        NutrientLevel::Moderate
    } else {
        NutrientLevel::High
    }
}

pub fn sodium_to_salt(sodium_grams: f64) -> f64 {
    sodium_grams * 2.5
}

/// Reads a numeric nutriment value. Upstream sends either JSON numbers or
/// numeric strings depending on the product.
pub fn numeric_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Looks up a nutriment, treating an explicit `null` as absent.
pub fn present<'a>(nutriments: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    nutriments.get(key).filter(|v| !v.is_null())
}

/// Renders a nutriment value the way upstream shows it: strings verbatim,
/// whole floats without a trailing `.0`.
pub fn display_amount(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}
