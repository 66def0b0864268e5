use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 发票状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Void,
    Draft,
    Sent,
    PartiallyPaid,
    #[default]
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Void => "void",
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Unknown => "N/A",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已付款发票 (拉取后只读)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub customer_name: String,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// 表格里使用的日期文本
    pub fn issue_day(&self) -> String {
        self.issue_date.format("%Y-%m-%d").to_string()
    }
}

/// 一页发票结果
#[derive(Debug, Clone, Default)]
pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub total: u64,
}

// ---------- 账单 API 报文 ----------

/// 发票列表先按原始 JSON 接收, 逐张转换, 坏的一张不影响整页
#[derive(Debug, Deserialize)]
pub struct ApiInvoiceList {
    #[serde(default)]
    pub invoices: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

impl ApiInvoiceList {
    /// 无法解析的发票 (如缺少 issueDate) 记录警告后跳过
    pub fn into_page(self) -> InvoicePage {
        let invoices = self
            .invoices
            .into_iter()
            .filter_map(|raw| {
                let id = raw.get("_id").and_then(Value::as_str).unwrap_or("N/A").to_string();
                match serde_json::from_value::<ApiInvoice>(raw) {
                    Ok(api) => Some(Invoice::from(api)),
                    Err(e) => {
                        tracing::warn!("Skipping invoice {}: {}", id, e);
                        None
                    }
                }
            })
            .collect();

        InvoicePage {
            invoices,
            total: self.total,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInvoice {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub invoice_number: Option<Value>,
    pub issue_date: DateTime<Utc>,
    #[serde(default)]
    pub contact_details: Option<ApiContactDetails>,
    #[serde(default)]
    pub total_summary: Option<ApiTotalSummary>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct ApiContactDetails {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTotalSummary {
    #[serde(default)]
    pub sub_total: Option<f64>,
    #[serde(default)]
    pub tax: Option<f64>,
}

/// f64 -> BigDecimal, 取最短十进制表示 (0.1 不会变成 0.1000000000000000055...)
fn decimal(value: Option<f64>) -> BigDecimal {
    value
        .and_then(|v| BigDecimal::from_str(&v.to_string()).ok())
        .unwrap_or_else(BigDecimal::zero)
}

fn text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

impl From<ApiInvoice> for Invoice {
    fn from(api: ApiInvoice) -> Self {
        let summary = api.total_summary;
        Self {
            id: api.id,
            invoice_number: text(api.invoice_number),
            issue_date: api.issue_date,
            customer_name: api
                .contact_details
                .and_then(|c| c.name)
                .unwrap_or_else(|| "N/A".to_string()),
            subtotal: decimal(summary.as_ref().and_then(|s| s.sub_total)),
            tax: decimal(summary.as_ref().and_then(|s| s.tax)),
            total: decimal(api.total),
            status: api.status,
        }
    }
}
