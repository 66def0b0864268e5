pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use error::AppError;
pub use service::{ChartSource, ReportService};
