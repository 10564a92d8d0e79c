pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod ocr;
pub mod pdf;
pub mod progress;
pub mod report;
pub mod sentiment;
pub mod server;
pub mod suggest;

pub use analyzer::{analyze, AnalysisResult};
pub use config::AppConfig;
pub use error::{ConfigError, ExtractError, ProcessError, SkippedFile};
pub use extractor::{ExtractionResult, Extractor, UploadedFile};
pub use report::{Pipeline, Report};
pub use suggest::{SuggestionClient, Suggestions};

/// Load `.env` (if present) and initialize logging; `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
