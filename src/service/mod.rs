pub mod aggregator;
pub mod chart;
pub mod export;
pub mod fetcher;
pub mod normalizer;
pub mod reformat;
pub mod report;
pub mod scheduler;
pub mod sheet_sync;

pub use aggregator::{aggregate_by_month, aggregate_by_month_where, MonthKey, MonthlyAggregate, TaxEntry};
pub use chart::ChartSource;
pub use export::{ChartExporter, RunStateStore};
pub use fetcher::{InvoiceFetcher, Pagination};
pub use normalizer::{format_currency, parse_currency, parse_date};
pub use reformat::reformat_sheet;
pub use report::{ReportService, ReportSummary};
pub use scheduler::run_daily;
pub use sheet_sync::SheetSynchronizer;
