use crate::core::trace::TraceRecorder;
use crate::domain::model::{LookupReport, ProductRecord, ProductReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn include_trace(&self) -> bool;
    fn compress_output(&self) -> bool;
    fn user_agent(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Fetches the raw product payload for one barcode.
    async fn extract(&self, barcode: &str) -> Result<ProductRecord>;
    /// Runs both extraction pipelines over an already-fetched payload.
    fn transform(&self, record: &ProductRecord) -> ProductReport;
    async fn load(&self, reports: &LookupReport) -> Result<String>;
}

/// One self-contained way of deriving results from a product payload.
///
/// `attempt` returns `None` when the branch of the payload the strategy reads
/// is absent, and `Some` (possibly empty) once the strategy has been entered.
pub trait ExtractionStrategy: Send + Sync {
    type Output;

    fn label(&self) -> &'static str;

    fn attempt(&self, record: &ProductRecord, trace: &mut TraceRecorder)
        -> Option<Vec<Self::Output>>;
}
