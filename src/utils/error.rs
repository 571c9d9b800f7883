use thiserror::Error;

#[derive(Error, Debug)]
pub enum NutritionError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid barcode '{barcode}': {reason}")]
    InvalidBarcodeError { barcode: String, reason: String },

    #[error("Product {barcode} not found")]
    ProductNotFoundError { barcode: String },

    #[error("Upstream returned HTTP {status} for product {barcode}")]
    UpstreamStatusError { barcode: String, status: u16 },

    #[error("Malformed payload for product {barcode}: {message}")]
    MalformedPayloadError { barcode: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Upstream,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NutritionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NutritionError::ConfigError { .. }
            | NutritionError::InvalidConfigValueError { .. }
            | NutritionError::MissingConfigError { .. } => ErrorCategory::Configuration,
            NutritionError::InvalidBarcodeError { .. } => ErrorCategory::Input,
            NutritionError::ApiError(_)
            | NutritionError::ProductNotFoundError { .. }
            | NutritionError::UpstreamStatusError { .. }
            | NutritionError::MalformedPayloadError { .. } => ErrorCategory::Upstream,
            NutritionError::ZipError(_)
            | NutritionError::CsvError(_)
            | NutritionError::IoError(_)
            | NutritionError::SerializationError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NutritionError::ProductNotFoundError { .. } => ErrorSeverity::Low,
            NutritionError::ApiError(_) | NutritionError::UpstreamStatusError { .. } => {
                ErrorSeverity::Medium
            }
            NutritionError::IoError(_) | NutritionError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// True for every way a product payload can fail to arrive. The caller
    /// sees these as one "load failed" condition and skips extraction.
    pub fn is_load_failure(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    /// Process exit code for a run that ended with this error. A failed
    /// product load means nothing was produced, so it never exits 0.
    pub fn exit_code(&self) -> i32 {
        if self.is_load_failure() {
            return 2;
        }
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NutritionError::ProductNotFoundError { .. } => {
                "Check the barcode; the product may not be in the database yet"
            }
            NutritionError::InvalidBarcodeError { .. } => "Barcodes are 8 to 14 digits (EAN-8, UPC-A, EAN-13, GTIN-14)",
            NutritionError::ApiError(_) | NutritionError::UpstreamStatusError { .. } => {
                "Check network connectivity and retry later"
            }
            NutritionError::MalformedPayloadError { .. } => {
                "Verify the API endpoint points at a product JSON API"
            }
            NutritionError::ConfigError { .. }
            | NutritionError::InvalidConfigValueError { .. }
            | NutritionError::MissingConfigError { .. } => "Review the command line flags or config file",
            _ => "Check that the output path is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NutritionError::ProductNotFoundError { barcode } => {
                format!("No product found for barcode {}", barcode)
            }
            e if e.is_load_failure() => format!("Failed to load product data: {}", e),
            e => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NutritionError>;
