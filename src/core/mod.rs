pub mod etl;
pub mod facts;
pub mod levels;
pub mod panels;
pub mod pipeline;
pub mod session;
pub mod strategy;
pub mod thresholds;
pub mod trace;

pub use crate::domain::model::{ProductRecord, ProductReport};
pub use crate::domain::ports::{ConfigProvider, ExtractionStrategy, Pipeline, Storage};
pub use crate::utils::error::Result;
