use crate::config::{DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{NutritionError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub include_trace: bool,
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_formats(),
            compress: false,
            include_trace: false,
        }
    }
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| NutritionError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values; undefined variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn include_trace(&self) -> bool {
        self.output.include_trace
    }

    fn compress_output(&self) -> bool {
        self.output.compress
    }

    fn user_agent(&self) -> &str {
        self.source.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_endpoint_template("source.endpoint", &self.source.endpoint)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_output_formats("output.formats", &self.output.formats)?;
        validation::validate_positive_number("source.timeout_seconds", self.timeout_seconds(), 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[source]
endpoint = "https://world.openfoodfacts.org/api/v2/product/{barcode}.json"
timeout_seconds = 3

[output]
path = "./reports"
formats = ["json", "csv"]
include_trace = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.output_path(), "./reports");
        assert_eq!(config.timeout_seconds(), 3);
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert!(config.include_trace());
        assert!(!config.compress_output());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_section_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "http://localhost:8080/product/{barcode}"
"#,
        )
        .unwrap();

        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert_eq!(config.output_formats(), &["json".to_string()]);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FOOD_FACTS_TEST_HOST", "https://test.api.com");

        let toml_content = r#"
[source]
endpoint = "${FOOD_FACTS_TEST_HOST}/product/{barcode}.json"
user_agent = "${FOOD_FACTS_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.endpoint, "https://test.api.com/product/{barcode}.json");
        assert_eq!(config.user_agent(), "${FOOD_FACTS_UNSET_VAR}");

        std::env::remove_var("FOOD_FACTS_TEST_HOST");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "https://api.example.com/product"

[output]
formats = ["xml"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[source").unwrap_err();
        assert!(matches!(err, NutritionError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\nendpoint = \"https://api.example.com/{barcode}\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api_endpoint(), "https://api.example.com/{barcode}");
    }
}
