use crate::domain::model::ProductReport;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// Interactive lookups where only the most recent request matters.
///
/// Each `lookup` takes a ticket before fetching. When the fetch completes
/// after a newer lookup has started, the payload is dropped without running
/// the extraction pipelines.
pub struct LookupSession<P: Pipeline> {
    pipeline: P,
    generation: AtomicU64,
}

impl<P: Pipeline> LookupSession<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            generation: AtomicU64::new(0),
        }
    }

    pub fn begin(&self) -> LookupTicket {
        LookupTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Returns `Ok(None)` when the lookup was superseded while in flight.
    pub async fn lookup(&self, barcode: &str) -> Result<Option<ProductReport>> {
        let ticket = self.begin();
        let fetched = self.pipeline.extract(barcode).await;

        if !self.is_current(ticket) {
            tracing::debug!("Discarding stale lookup for {}", barcode);
            return Ok(None);
        }

        let record = fetched?;
        Ok(Some(self.pipeline.transform(&record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LookupReport, ProductRecord};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Barcodes starting with '1' are slow.
    struct DelayedPipeline;

    #[async_trait]
    impl Pipeline for DelayedPipeline {
        async fn extract(&self, barcode: &str) -> Result<ProductRecord> {
            if barcode.starts_with('1') {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(ProductRecord::new(barcode, serde_json::json!({"nutrient_levels": {"fat": "low"}})))
        }

        fn transform(&self, record: &ProductRecord) -> ProductReport {
            ProductReport {
                barcode: record.barcode.clone(),
                product_name: None,
                levels: crate::core::levels::extract_levels(record).0,
                facts: Vec::new(),
                level_trace: None,
                facts_trace: None,
                extracted_at: chrono::Utc::now(),
            }
        }

        async fn load(&self, _report: &LookupReport) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_tickets() {
        let session = LookupSession::new(DelayedPipeline);
        let first = session.begin();
        assert!(session.is_current(first));
        let second = session.begin();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[tokio::test]
    async fn test_newer_lookup_wins() {
        let session = LookupSession::new(DelayedPipeline);
        let (slow, fast) = tokio::join!(session.lookup("11111111"), session.lookup("22222222"));

        assert!(slow.unwrap().is_none());
        let fast = fast.unwrap().unwrap();
        assert_eq!(fast.barcode, "22222222");
        assert_eq!(fast.levels.len(), 1);
    }

    #[tokio::test]
    async fn test_single_lookup_completes() {
        let session = LookupSession::new(DelayedPipeline);
        let report = session.lookup("11111111").await.unwrap();
        assert!(report.is_some());
    }
}
