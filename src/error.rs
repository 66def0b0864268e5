use std::path::PathBuf;
use thiserror::Error;

/// 单元格解析错误 (日期/金额)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Unparseable date: {0:?}")]
    UnparseableDate(String),

    #[error("Unparseable currency: {0:?}")]
    UnparseableCurrency(String),
}

/// 账单 API 拉取错误
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Billing API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Billing API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Billing API response could not be decoded: {0}")]
    Decode(String),
}

/// 表格同步错误
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sheets API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Sheets API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sheets API response could not be decoded: {0}")]
    Decode(String),

    #[error("No data found in {range}")]
    NoSourceData { range: String },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

/// 本地凭据文件错误
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field {field} missing in {path}")]
    MissingField { path: PathBuf, field: &'static str },
}

/// 图表数据落盘错误
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize chart data: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Local time {0} does not exist")]
    InvalidLocalTime(chrono::NaiveDateTime),
}

/// 顶层错误: 一次运行中止的原因
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
