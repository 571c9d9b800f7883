use crate::core::facts::FactsExtractionPipeline;
use crate::core::levels::LevelExtractionPipeline;
use crate::domain::model::{LookupReport, ProductRecord, ProductReport};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{NutritionError, Result};
use crate::utils::validation::{validate_barcode, BARCODE_PLACEHOLDER};
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::time::Duration;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ZIP_FILENAME: &str = "nutrition_report.zip";
pub const JSON_FILENAME: &str = "report.json";
pub const LEVELS_CSV_FILENAME: &str = "levels.csv";
pub const FACTS_CSV_FILENAME: &str = "facts.csv";

pub struct ProductPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
    levels: LevelExtractionPipeline,
    facts: FactsExtractionPipeline,
}

impl<S: Storage, C: ConfigProvider> ProductPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            storage,
            config,
            client,
            levels: LevelExtractionPipeline::new(),
            facts: FactsExtractionPipeline::new(),
        })
    }

    pub fn product_url(&self, barcode: &str) -> String {
        self.config.api_endpoint().replace(BARCODE_PLACEHOLDER, barcode)
    }

    /// Loads a saved payload through storage instead of the API.
    pub async fn extract_from_storage(&self, path: &str) -> Result<ProductRecord> {
        let bytes = self.storage.read_file(path).await?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
        let barcode = payload_barcode(&payload).unwrap_or_else(|| path.to_string());
        record_from_payload(&barcode, payload)
    }

    fn csv_files(&self, report: &LookupReport) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut levels = csv::Writer::from_writer(Vec::new());
        levels.write_record(["barcode", "nutrient", "level", "value"])?;
        let mut facts = csv::Writer::from_writer(Vec::new());
        facts.write_record(["barcode", "nutrient", "value"])?;

        for product in &report.reports {
            for entry in &product.levels {
                levels.write_record([
                    product.barcode.as_str(),
                    entry.nutrient.display_name(),
                    entry.level.as_str(),
                    entry.value.as_str(),
                ])?;
            }
            for row in &product.facts {
                facts.write_record([product.barcode.as_str(), row.nutrient.as_str(), row.value.as_str()])?;
            }
        }

        let levels = levels.into_inner().map_err(|e| NutritionError::IoError(e.into_error()))?;
        let facts = facts.into_inner().map_err(|e| NutritionError::IoError(e.into_error()))?;
        Ok(vec![(LEVELS_CSV_FILENAME, levels), (FACTS_CSV_FILENAME, facts)])
    }

    fn output_files(&self, report: &LookupReport) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            match format.as_str() {
                "json" => files.push((JSON_FILENAME, serde_json::to_vec_pretty(report)?)),
                "csv" => files.extend(self.csv_files(report)?),
                other => {
                    return Err(NutritionError::InvalidConfigValueError {
                        field: "output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format".to_string(),
                    })
                }
            }
        }
        Ok(files)
    }
}

/// Unwraps the `{status, product}` envelope, or accepts a bare product object.
pub fn record_from_payload(barcode: &str, payload: serde_json::Value) -> Result<ProductRecord> {
    let serde_json::Value::Object(mut envelope) = payload else {
        return Err(NutritionError::MalformedPayloadError {
            barcode: barcode.to_string(),
            message: "payload is not a JSON object".to_string(),
        });
    };

    let status = envelope.get("status").and_then(|s| s.as_i64());
    if status == Some(0) {
        return Err(NutritionError::ProductNotFoundError {
            barcode: barcode.to_string(),
        });
    }

    match envelope.remove("product") {
        Some(product @ serde_json::Value::Object(_)) => Ok(ProductRecord::new(barcode, product)),
        Some(_) => Err(NutritionError::MalformedPayloadError {
            barcode: barcode.to_string(),
            message: "product is not a JSON object".to_string(),
        }),
        None if status.is_some() => Err(NutritionError::ProductNotFoundError {
            barcode: barcode.to_string(),
        }),
        None => Ok(ProductRecord::new(barcode, serde_json::Value::Object(envelope))),
    }
}

fn payload_barcode(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("code")
        .or_else(|| payload.get("product").and_then(|p| p.get("code")))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ProductPipeline<S, C> {
    async fn extract(&self, barcode: &str) -> Result<ProductRecord> {
        validate_barcode(barcode)?;

        let url = self.product_url(barcode);
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status == StatusCode::NOT_FOUND {
            return Err(NutritionError::ProductNotFoundError {
                barcode: barcode.to_string(),
            });
        }
        if !status.is_success() {
            return Err(NutritionError::UpstreamStatusError {
                barcode: barcode.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let payload: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| NutritionError::MalformedPayloadError {
                barcode: barcode.to_string(),
                message: e.to_string(),
            })?;

        record_from_payload(barcode, payload)
    }

    fn transform(&self, record: &ProductRecord) -> ProductReport {
        let (levels, level_trace) = self.levels.extract(record);
        let (facts, facts_trace) = self.facts.extract(record);
        let include_trace = self.config.include_trace();

        ProductReport {
            barcode: record.barcode.clone(),
            product_name: record.product_name().map(str::to_string),
            levels,
            facts,
            level_trace: include_trace.then_some(level_trace),
            facts_trace: include_trace.then_some(facts_trace),
            extracted_at: chrono::Utc::now(),
        }
    }

    async fn load(&self, report: &LookupReport) -> Result<String> {
        let files = self.output_files(report)?;
        tracing::debug!("Prepared {} output file(s)", files.len());

        if self.config.compress_output() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file(*name, SimpleFileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(ZIP_FILENAME, &zip_data).await?;
            return Ok(format!("{}/{}", self.config.output_path(), ZIP_FILENAME));
        }

        let mut written = Vec::with_capacity(files.len());
        for (name, data) in &files {
            self.storage.write_file(name, data).await?;
            written.push(format!("{}/{}", self.config.output_path(), name));
        }
        Ok(written.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NutrientKind, NutrientLevel};
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                NutritionError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        api_endpoint: String,
        formats: Vec<String>,
        include_trace: bool,
        compress: bool,
    }

    impl MockConfig {
        fn new(api_endpoint: String) -> Self {
            Self {
                api_endpoint,
                formats: vec!["json".to_string(), "csv".to_string()],
                include_trace: false,
                compress: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn include_trace(&self) -> bool {
            self.include_trace
        }

        fn compress_output(&self) -> bool {
            self.compress
        }

        fn user_agent(&self) -> &str {
            "food-facts-etl-tests"
        }

        fn timeout_seconds(&self) -> u64 {
            5
        }
    }

    fn pipeline(server: &MockServer, storage: MockStorage) -> ProductPipeline<MockStorage, MockConfig> {
        let config = MockConfig::new(format!("{}/api/v2/product/{{barcode}}.json", server.base_url()));
        ProductPipeline::new(storage, config).unwrap()
    }

    #[tokio::test]
    async fn test_extract_unwraps_envelope() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/product/3017620422003.json")
                .header("user-agent", "food-facts-etl-tests");
            then.status(200).json_body(serde_json::json!({
                "code": "3017620422003",
                "status": 1,
                "product": {"product_name": "Hazelnut spread", "nutrient_levels": {"sugars": "high"}}
            }));
        });

        let pipeline = pipeline(&server, MockStorage::new());
        let record = pipeline.extract("3017620422003").await.unwrap();

        api_mock.assert();
        assert_eq!(record.barcode, "3017620422003");
        assert_eq!(record.product_name(), Some("Hazelnut spread"));
    }

    #[tokio::test]
    async fn test_extract_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/product/12345678.json");
            then.status(404)
                .json_body(serde_json::json!({"status": 0, "status_verbose": "product not found"}));
        });

        let pipeline = pipeline(&server, MockStorage::new());
        let err = pipeline.extract("12345678").await.unwrap_err();
        assert!(matches!(err, NutritionError::ProductNotFoundError { .. }));
        assert!(err.is_load_failure());
    }

    #[tokio::test]
    async fn test_extract_upstream_failure_and_garbage() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/product/11111111.json");
            then.status(503);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/product/22222222.json");
            then.status(200).body("<html>maintenance</html>");
        });

        let pipeline = pipeline(&server, MockStorage::new());
        let err = pipeline.extract("11111111").await.unwrap_err();
        assert!(matches!(err, NutritionError::UpstreamStatusError { status: 503, .. }));
        let err = pipeline.extract("22222222").await.unwrap_err();
        assert!(matches!(err, NutritionError::MalformedPayloadError { .. }));
    }

    #[tokio::test]
    async fn test_invalid_barcode_never_hits_network() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET);
            then.status(200);
        });

        let pipeline = pipeline(&server, MockStorage::new());
        let err = pipeline.extract("../etc").await.unwrap_err();
        assert!(matches!(err, NutritionError::InvalidBarcodeError { .. }));
        api_mock.assert_hits(0);
    }

    #[test]
    fn test_record_from_payload_variants() {
        let bare = record_from_payload("1", serde_json::json!({"nutriments": {}})).unwrap();
        assert!(bare.nutriments().is_some());

        let missing = record_from_payload("1", serde_json::json!({"status": 1}));
        assert!(matches!(missing, Err(NutritionError::ProductNotFoundError { .. })));

        let wrong = record_from_payload("1", serde_json::json!({"product": []}));
        assert!(matches!(wrong, Err(NutritionError::MalformedPayloadError { .. })));

        let array = record_from_payload("1", serde_json::json!([1, 2]));
        assert!(matches!(array, Err(NutritionError::MalformedPayloadError { .. })));
    }

    #[tokio::test]
    async fn test_transform_traces_are_optional() {
        let server = MockServer::start();
        let record = ProductRecord::new("1", serde_json::json!({"nutriments": {"fat": 25}}));

        let plain = pipeline(&server, MockStorage::new());
        let report = plain.transform(&record);
        assert!(report.level_trace.is_none());
        assert_eq!(report.levels[0].nutrient, NutrientKind::Fat);
        assert_eq!(report.levels[0].level, NutrientLevel::High);
        assert_eq!(report.facts[0].value, "25 g");

        let mut config = MockConfig::new(server.url("/{barcode}"));
        config.include_trace = true;
        let traced = ProductPipeline::new(MockStorage::new(), config).unwrap();
        let report = traced.transform(&record);
        assert_eq!(report.level_trace.unwrap().method_used, "Nutriment Threshold");
        assert_eq!(report.facts_trace.unwrap().result_count, 1);
    }

    #[tokio::test]
    async fn test_load_writes_json_and_csv() {
        let server = MockServer::start();
        let storage = MockStorage::new();
        let pipeline = pipeline(&server, storage.clone());

        let record = ProductRecord::new(
            "3017620422003",
            serde_json::json!({"nutriments": {"energy-kcal": 539, "energy-kj": 2252, "sugars": 56.3}}),
        );
        let report = LookupReport {
            reports: vec![pipeline.transform(&record)],
            failures: vec![],
        };

        let output = pipeline.load(&report).await.unwrap();
        assert!(output.contains("report.json"));

        let json: serde_json::Value =
            serde_json::from_slice(&storage.get_file(JSON_FILENAME).await.unwrap()).unwrap();
        assert_eq!(json["reports"][0]["levels"][0]["level"], "high");

        let levels = String::from_utf8(storage.get_file(LEVELS_CSV_FILENAME).await.unwrap()).unwrap();
        assert!(levels.starts_with("barcode,nutrient,level,value"));
        assert!(levels.contains("3017620422003,Sugars,high,56.3g"));

        let facts = String::from_utf8(storage.get_file(FACTS_CSV_FILENAME).await.unwrap()).unwrap();
        assert!(facts.contains("\"2252 kj\n(539 kcal)\""));
    }

    #[tokio::test]
    async fn test_load_compressed() {
        let server = MockServer::start();
        let storage = MockStorage::new();
        let mut config = MockConfig::new(server.url("/{barcode}"));
        config.compress = true;
        let pipeline = ProductPipeline::new(storage.clone(), config).unwrap();

        let output = pipeline.load(&LookupReport::default()).await.unwrap();
        assert_eq!(output, format!("test_output/{}", ZIP_FILENAME));

        let zip_data = storage.get_file(ZIP_FILENAME).await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&JSON_FILENAME));
        assert!(names.contains(&LEVELS_CSV_FILENAME));
        assert!(names.contains(&FACTS_CSV_FILENAME));
        assert!(storage.get_file(JSON_FILENAME).await.is_none());
    }

    #[tokio::test]
    async fn test_extract_from_storage() {
        let server = MockServer::start();
        let storage = MockStorage::new();
        storage
            .write_file(
                "saved.json",
                br#"{"code": "96385074", "status": 1, "product": {"nutrient_levels": {"salt": "low"}}}"#,
            )
            .await
            .unwrap();

        let pipeline = pipeline(&server, storage);
        let record = pipeline.extract_from_storage("saved.json").await.unwrap();
        assert_eq!(record.barcode, "96385074");
        assert!(record.nutrient_levels().is_some());
    }
}
