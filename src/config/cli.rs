use crate::config::{DEFAULT_API_ENDPOINT, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "food-facts-etl")]
#[command(about = "Look up products by barcode and extract nutrient levels and nutrition facts")]
pub struct CliConfig {
    /// Barcodes to look up
    pub barcodes: Vec<String>,

    /// Read a saved product JSON file instead of calling the API
    #[arg(long)]
    pub input: Option<String>,

    /// TOML file with source and output settings; overrides the flags below
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value = DEFAULT_API_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json")]
    pub formats: Vec<String>,

    #[arg(long, help = "Include extraction traces in the output")]
    pub trace: bool,

    #[arg(long, help = "Bundle output files into a ZIP archive")]
    pub compress: bool,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn include_trace(&self) -> bool {
        self.trace
    }

    fn compress_output(&self) -> bool {
        self.compress
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_endpoint_template("api_endpoint", &self.api_endpoint)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;

        if self.barcodes.is_empty() && self.input.is_none() {
            return Err(crate::utils::error::NutritionError::MissingConfigError {
                field: "barcodes".to_string(),
            });
        }
        for barcode in &self.barcodes {
            validation::validate_barcode(barcode)?;
        }
        Ok(())
    }
}
