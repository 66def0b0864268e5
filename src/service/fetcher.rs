use crate::client::{BillingApi, InvoiceQuery};
use crate::error::FetchError;
use crate::models::Invoice;
use chrono::NaiveDate;
use std::sync::Arc;

/// 翻页策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: u32,
    /// 最多请求的页数; None 表示一直翻到 total
    pub max_pages: Option<u32>,
}

impl Pagination {
    /// 只取第一页
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size,
            max_pages: Some(1),
        }
    }

    /// 配置里 0 表示不限页数
    pub fn from_config(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size,
            max_pages: (max_pages > 0).then_some(max_pages),
        }
    }
}

/// 已付款发票拉取
pub struct InvoiceFetcher {
    api: Arc<dyn BillingApi>,
    pagination: Pagination,
}

impl InvoiceFetcher {
    pub fn new(api: Arc<dyn BillingApi>, pagination: Pagination) -> Self {
        Self { api, pagination }
    }

    pub fn api(&self) -> &Arc<dyn BillingApi> {
        &self.api
    }

    /// 拉取 [start, end] 内的已付款发票, 不做重试
    pub async fn fetch_paid_invoices(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Invoice>, FetchError> {
        tracing::info!("Fetching paid invoices from {} to {}...", start, end);

        let mut invoices = Vec::new();
        let mut query = InvoiceQuery {
            start,
            end,
            limit: self.pagination.page_size,
            offset: 0,
        };
        let mut pages = 0u32;

        loop {
            let page = match self.api.list_invoices(&query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Error fetching invoices: {}", e);
                    return Err(e);
                }
            };
            pages += 1;

            let received = page.invoices.len();
            tracing::info!(
                "Page {} (offset {}): {} invoices, {} total paid invoices",
                pages,
                query.offset,
                received,
                page.total
            );
            invoices.extend(page.invoices);

            let next_offset = u64::from(query.offset) + received as u64;
            let more_available = received > 0 && next_offset < page.total;
            let page_budget_left = self.pagination.max_pages.map_or(true, |max| pages < max);

            if !more_available {
                break;
            }
            if !page_budget_left {
                tracing::warn!(
                    "Stopping after {} page(s): {} of {} paid invoices fetched",
                    pages,
                    invoices.len(),
                    page.total
                );
                break;
            }
            query.offset = query.offset.saturating_add(received as u32);
        }

        tracing::info!("Fetched {} paid invoices", invoices.len());
        Ok(invoices)
    }
}
