use crate::domain::model::{FailedLookup, LookupReport, ProductRecord};
use crate::domain::ports::Pipeline;
use crate::utils::error::{NutritionError, Result};

#[derive(Debug)]
pub struct EtlOutcome {
    pub report: LookupReport,
    pub output_path: String,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Looks up every barcode in turn. A barcode that fails to load is
    /// recorded as a failure and the run continues; output errors abort.
    pub async fn run(&self, barcodes: &[String]) -> Result<EtlOutcome> {
        tracing::info!("Looking up {} product(s)", barcodes.len());
        let mut report = LookupReport::default();

        for barcode in barcodes {
            match self.pipeline.extract(barcode).await {
                Ok(record) => {
                    let product = self.pipeline.transform(&record);
                    tracing::info!(
                        "✅ {}: {} level(s), {} fact row(s)",
                        barcode,
                        product.levels.len(),
                        product.facts.len()
                    );
                    report.reports.push(product);
                }
                Err(e) if e.is_load_failure() || matches!(e, NutritionError::InvalidBarcodeError { .. }) => {
                    tracing::warn!("❌ {}: {}", barcode, e);
                    report.failures.push(FailedLookup {
                        barcode: barcode.clone(),
                        message: e.user_friendly_message(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.finish(report).await
    }

    /// Runs extraction over payloads that were obtained some other way.
    pub async fn run_records(&self, records: &[ProductRecord]) -> Result<EtlOutcome> {
        let report = LookupReport {
            reports: records.iter().map(|r| self.pipeline.transform(r)).collect(),
            failures: Vec::new(),
        };
        self.finish(report).await
    }

    async fn finish(&self, report: LookupReport) -> Result<EtlOutcome> {
        tracing::info!(
            "Transformed {} product(s), {} failed lookup(s)",
            report.reports.len(),
            report.failures.len()
        );
        let output_path = self.pipeline.load(&report).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(EtlOutcome { report, output_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ProductReport;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubPipeline {
        loaded: Mutex<Option<LookupReport>>,
    }

    #[async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self, barcode: &str) -> Result<ProductRecord> {
            match barcode {
                "00000000" => Err(NutritionError::ProductNotFoundError {
                    barcode: barcode.to_string(),
                }),
                "99999999" => Err(NutritionError::ConfigError {
                    message: "broken".to_string(),
                }),
                _ => Ok(ProductRecord::new(barcode, json!({"nutriments": {"salt": 2}}))),
            }
        }

        fn transform(&self, record: &ProductRecord) -> ProductReport {
            ProductReport {
                barcode: record.barcode.clone(),
                product_name: None,
                levels: crate::core::levels::extract_levels(record).0,
                facts: crate::core::facts::extract_facts(record).0,
                level_trace: None,
                facts_trace: None,
                extracted_at: chrono::Utc::now(),
            }
        }

        async fn load(&self, report: &LookupReport) -> Result<String> {
            *self.loaded.lock().unwrap() = Some(report.clone());
            Ok("memory".to_string())
        }
    }

    fn engine() -> EtlEngine<StubPipeline> {
        EtlEngine::new(StubPipeline {
            loaded: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_failed_lookup_does_not_stop_run() {
        let engine = engine();
        let outcome = engine
            .run(&["12345678".to_string(), "00000000".to_string()])
            .await
            .unwrap();

        assert_eq!(outcome.output_path, "memory");
        assert_eq!(outcome.report.reports.len(), 1);
        assert_eq!(outcome.report.failures.len(), 1);
        assert_eq!(outcome.report.failures[0].barcode, "00000000");
        assert!(engine.pipeline().loaded.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_load_errors_abort() {
        let engine = engine();
        let result = engine.run(&["99999999".to_string()]).await;
        assert!(matches!(result, Err(NutritionError::ConfigError { .. })));
        assert!(engine.pipeline().loaded.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_records() {
        let engine = engine();
        let records = vec![ProductRecord::new("1", json!({"nutriments": {"fat": 1}}))];
        let outcome = engine.run_records(&records).await.unwrap();
        assert_eq!(outcome.report.reports[0].levels.len(), 1);
        assert!(outcome.report.failures.is_empty());
    }
}
