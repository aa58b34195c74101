pub mod agent;
pub mod clean;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod logger;
pub mod output;
pub mod profile;
pub mod stats;
pub mod util;
pub mod validate;

// Re-exports for convenience
pub use agent::{AgentOutput, CleaningAgent};
pub use clean::{CleaningOptions, CleaningPipeline, CleaningReport};
pub use config::Config;
pub use data::{read_csv, write_csv, CsvOptions, Dataset, Value};
pub use error::{CleanError, Result};
