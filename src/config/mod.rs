#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use storage::LocalStorage;
pub use toml_config::TomlConfig;

pub const DEFAULT_API_ENDPOINT: &str = "https://world.openfoodfacts.org/api/v2/product/{barcode}.json";
pub const DEFAULT_USER_AGENT: &str = concat!("food-facts-etl/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
