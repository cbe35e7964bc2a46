pub mod aggregate;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod model;
pub mod pipeline;
pub mod sink;
pub mod testing;

pub use aggregate::{sort_packages, SortKey};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ExtractorBackend,
    HttpConfig, OutputConfig, ScrapeConfig,
};
pub use extractor::{create_extractor, Extractor, FieldScanExtractor, StateBlockExtractor};
pub use fetcher::{FetchError, Fetcher, HttpFetcher, RetryPolicy};
pub use model::Package;
pub use pipeline::{EnrichTask, RunOutcome, RunSummary, ScrapeRunner};
pub use sink::{read_artifact, JsonFileSink, Sink, SinkError};
