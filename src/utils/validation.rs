use crate::utils::error::{NutritionError, Result};
use std::collections::HashSet;
use url::Url;

pub const BARCODE_PLACEHOLDER: &str = "{barcode}";
pub const SUPPORTED_FORMATS: [&str; 2] = ["json", "csv"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Validates an endpoint template such as
/// `https://world.openfoodfacts.org/api/v2/product/{barcode}.json`.
pub fn validate_endpoint_template(field_name: &str, template: &str) -> Result<()> {
    if !template.contains(BARCODE_PLACEHOLDER) {
        return Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: format!("Endpoint must contain the {} placeholder", BARCODE_PLACEHOLDER),
        });
    }
    validate_url(field_name, &template.replace(BARCODE_PLACEHOLDER, "0"))
        .map_err(|e| match e {
            NutritionError::InvalidConfigValueError { field, reason, .. } => {
                NutritionError::InvalidConfigValueError {
                    field,
                    value: template.to_string(),
                    reason,
                }
            }
            other => other,
        })
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(NutritionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(NutritionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_output_formats(field_name: &str, formats: &[String]) -> Result<()> {
    if formats.is_empty() {
        return Err(NutritionError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let allowed: HashSet<&str> = SUPPORTED_FORMATS.iter().copied().collect();
    for format in formats {
        if !allowed.contains(format.as_str()) {
            return Err(NutritionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    SUPPORTED_FORMATS.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// EAN-8, UPC-A, EAN-13 and GTIN-14 codes: 8 to 14 ASCII digits.
pub fn validate_barcode(barcode: &str) -> Result<()> {
    let reason = if barcode.is_empty() {
        "barcode is empty"
    } else if !barcode.bytes().all(|b| b.is_ascii_digit()) {
        "barcode must contain digits only"
    } else if !(8..=14).contains(&barcode.len()) {
        "barcode must be 8 to 14 digits long"
    } else {
        return Ok(());
    };

    Err(NutritionError::InvalidBarcodeError {
        barcode: barcode.to_string(),
        reason: reason.to_string(),
    })
}
