use crate::config::BillingConfig;
use crate::error::FetchError;
use crate::models::{ApiInvoiceList, InvoicePage};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde_json::Value;

/// 发票列表查询参数 (固定: 已付款 + live 模式, 按开票日期降序)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub limit: u32,
    pub offset: u32,
}

impl InvoiceQuery {
    pub fn params(&self, location_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("altId", location_id.to_string()),
            ("altType", "location".to_string()),
            ("startAt", self.start.format("%Y-%m-%d").to_string()),
            ("endAt", self.end.format("%Y-%m-%d").to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("sortField", "issueDate".to_string()),
            ("sortOrder", "descend".to_string()),
            ("paymentMode", "live".to_string()),
            ("status", "paid".to_string()),
        ]
    }
}

/// 账单 API
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// 拉取一页发票
    async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoicePage, FetchError>;

    /// 查询单张发票, 原样返回 JSON
    async fn get_invoice(&self, invoice_id: &str) -> Result<Value, FetchError>;
}

/// HighLevel (LeadConnector) 账单 API 客户端
pub struct HighLevelClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_version: String,
    location_id: String,
}

impl HighLevelClient {
    pub fn new(http: Client, config: &BillingConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            location_id: config.location_id.clone(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .header("Accept", "application/json")
    }

    async fn read_body(response: Response) -> Result<String, FetchError> {
        let status = response.status();
        tracing::info!("Status Code: {}", status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl BillingApi for HighLevelClient {
    async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoicePage, FetchError> {
        let params = query.params(&self.location_id);
        tracing::debug!("URL: {}/invoices/", self.base_url);
        tracing::debug!("Params: {:?}", params);

        let response = self.get("/invoices/").query(&params).send().await?;
        let body = Self::read_body(response).await?;

        let list: ApiInvoiceList =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(list.into_page())
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<Value, FetchError> {
        tracing::info!("Fetching invoice {}...", invoice_id);

        let response = self
            .get(&format!("/invoices/{}", invoice_id))
            .query(&[("altId", self.location_id.as_str()), ("altType", "location")])
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
