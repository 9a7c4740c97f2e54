//! Sales insights: lowest-performing customers, improvement suggestions and
//! threshold-based reasons computed over one uploaded CSV dataset.

pub mod config;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod models;
pub mod report;
pub mod selector;
pub mod server;
pub mod store;

pub use config::{ServerConfig, Thresholds};
pub use error::{InsightError, InsightResult};
pub use ingest::{load_dataset, load_dataset_file, REQUIRED_COLUMNS};
pub use insights::{compute_reasons, generate_suggestions};
pub use models::{Dataset, Metric, ReasonEntry, Record, SuggestionEntry};
pub use selector::{select_high_performers, select_low_performers};
pub use server::{build_router, serve, AppState};
pub use store::DatasetStore;
