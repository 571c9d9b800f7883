pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, TomlConfig};

pub use self::core::{
    etl::{EtlEngine, EtlOutcome},
    facts::{extract_facts, FactsExtractionPipeline},
    levels::{extract_levels, LevelExtractionPipeline},
    pipeline::ProductPipeline,
    session::LookupSession,
};
pub use domain::model::{
    ExtractionTrace, NutrientKind, NutrientLevel, NutrientLevelEntry, NutritionFactRow, ProductRecord,
    ProductReport,
};
pub use utils::error::{NutritionError, Result};
