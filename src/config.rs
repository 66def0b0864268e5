use chrono::NaiveTime;
use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth_server: ServerConfig,
    pub billing: BillingConfig,
    pub sheets: SheetsConfig,
    pub report: ReportConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 账单 API (HighLevel) 配置
#[derive(Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub base_url: String,
    pub api_version: String,
    pub api_key: String,
    pub location_id: String,
    pub page_size: u32,
    /// 最多拉取的页数, 0 表示一直翻到 total
    pub max_pages: u32,
    pub lookback_days: i64,
}

// api_key 不进日志
impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("api_key", &"***")
            .field("location_id", &self.location_id)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("lookback_days", &self.lookback_days)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    /// 主数据页签
    pub worksheet_name: String,
    /// 每次重建的派生页签
    pub derived_sheet: String,
    /// 图表服务读取的页签
    pub chart_source_sheet: String,
    pub invoice_range: String,
    #[serde(default)]
    pub access_token: Option<String>,
    pub token_file: PathBuf,
    pub credentials_file: PathBuf,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet_name", &self.worksheet_name)
            .field("derived_sheet", &self.derived_sheet)
            .field("chart_source_sheet", &self.chart_source_sheet)
            .field("invoice_range", &self.invoice_range)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("token_file", &self.token_file)
            .field("credentials_file", &self.credentials_file)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub chart_file: PathBuf,
    pub last_run_file: PathBuf,
    pub log_file: PathBuf,
    pub chart_top_months: usize,
    pub chart_window_days: i64,
    /// 内嵌图表页面地址 (用于日志里的 iframe 片段)
    pub chart_page_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 每日运行时间, "HH:MM" 本地时间
    pub run_at: String,
    pub tick_secs: u64,
    pub error_backoff_secs: u64,
}

impl ScheduleConfig {
    pub fn run_at_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.run_at, "%H:%M")
            .map_err(|e| ConfigError::Message(format!("schedule.run_at {:?}: {}", self.run_at, e)))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            auth_server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            billing: BillingConfig {
                base_url: "https://services.leadconnectorhq.com".to_string(),
                api_version: "2021-07-28".to_string(),
                api_key: String::new(),
                location_id: String::new(),
                page_size: 100,
                max_pages: 1,
                lookback_days: 365,
            },
            sheets: SheetsConfig {
                base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
                spreadsheet_id: String::new(),
                worksheet_name: "Sheet1".to_string(),
                derived_sheet: "Reformatted".to_string(),
                chart_source_sheet: "copy of reformatted".to_string(),
                invoice_range: "A1:G1000".to_string(),
                access_token: None,
                token_file: PathBuf::from("token.json"),
                credentials_file: PathBuf::from("credentials.json"),
            },
            report: ReportConfig {
                chart_file: PathBuf::from("chart_data.json"),
                last_run_file: PathBuf::from("last_run.txt"),
                log_file: PathBuf::from("sales_tax_report.log"),
                chart_top_months: 3,
                chart_window_days: 90,
                chart_page_url: "http://localhost:8000/chart.html".to_string(),
            },
            schedule: ScheduleConfig {
                run_at: "01:00".to_string(),
                tick_secs: 60,
                error_backoff_secs: 300,
            },
        }
    }
}

/// 历史环境变量名 -> 配置键
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HIGHLEVEL_API_KEY", "billing.api_key"),
    ("HIGHLEVEL_SUBACCOUNT_ID", "billing.location_id"),
    ("HIGHLEVEL_BASE_URL", "billing.base_url"),
    ("SPREADSHEET_ID", "sheets.spreadsheet_id"),
    ("WORKSHEET_NAME", "sheets.worksheet_name"),
    ("SHEETS_ACCESS_TOKEN", "sheets.access_token"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("AUTH_SERVER_PORT", "auth_server.port"),
];

impl AppConfig {
    /// 加载配置: 默认值 -> settings.{toml,yaml,json} -> 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("settings").required(false));

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, lookup(var))?;
        }

        builder.build()?.try_deserialize()
    }
}
