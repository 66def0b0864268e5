use super::aggregator::{aggregate_by_month, TaxEntry};
use super::export::{ChartExporter, RunStateStore};
use super::fetcher::InvoiceFetcher;
use super::normalizer::format_currency;
use super::sheet_sync::SheetSynchronizer;
use crate::error::AppError;
use crate::models::{ChartEntry, Invoice};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Local, NaiveDate};

const RULE: &str = "--------------------------------------------------------------------------------";

/// 一次报表运行的结果
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub invoice_count: usize,
    pub total_sales: BigDecimal,
    pub total_tax: BigDecimal,
    pub cells_written: usize,
    pub chart: Vec<ChartEntry>,
}

/// 内嵌 iframe 片段
pub fn embed_snippet(src: &str) -> String {
    format!(
        r#"<iframe src="{}" width="100%" height="600" frameborder="0" style="border: 1px solid #ccc;"></iframe>"#,
        src
    )
}

/// 销售税报表: 拉取 -> 月度汇总 -> 图表数据 -> 写表格 -> 记录运行时间
pub struct ReportService {
    fetcher: InvoiceFetcher,
    sync: SheetSynchronizer,
    exporter: ChartExporter,
    run_state: RunStateStore,
    lookback_days: i64,
    spreadsheet_id: String,
    chart_page_url: String,
}

impl ReportService {
    pub fn new(
        fetcher: InvoiceFetcher,
        sync: SheetSynchronizer,
        exporter: ChartExporter,
        run_state: RunStateStore,
        lookback_days: i64,
    ) -> Self {
        Self {
            fetcher,
            sync,
            exporter,
            run_state,
            lookback_days,
            spreadsheet_id: String::new(),
            chart_page_url: String::new(),
        }
    }

    /// 日志中输出内嵌片段所需的地址
    pub fn with_embeds(mut self, spreadsheet_id: impl Into<String>, chart_page_url: impl Into<String>) -> Self {
        self.spreadsheet_id = spreadsheet_id.into();
        self.chart_page_url = chart_page_url.into();
        self
    }

    pub fn fetcher(&self) -> &InvoiceFetcher {
        &self.fetcher
    }

    pub fn sync(&self) -> &SheetSynchronizer {
        &self.sync
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    /// 生成报表; 任一步失败即中止, 已写入表格的部分不回滚
    pub async fn generate_report(&self, now: DateTime<Local>) -> Result<ReportSummary, AppError> {
        let last_run = self.run_state.load(now);
        tracing::info!("Last successful run: {}", last_run.format("%Y-%m-%d %H:%M:%S"));

        let end = now.date_naive();
        let start = end - Duration::days(self.lookback_days);

        let invoices = self.fetcher.fetch_paid_invoices(start, end).await?;

        tracing::info!("=== Sales Tax Report ===");
        tracing::info!("Period: {} to {}", start, end);
        let (total_sales, total_tax) = log_invoices(&invoices);

        let entries: Vec<TaxEntry> = invoices
            .iter()
            .map(|inv| TaxEntry::new(inv.issue_day(), inv.tax.clone()))
            .collect();
        let aggregate = aggregate_by_month(&entries);
        for (month, tax) in aggregate.descending() {
            tracing::info!("{}: {}", month, format_currency(Some(&tax)));
        }

        let chart = self.exporter.export_chart_data(&aggregate)?;
        let cells_written = self.sync.write_invoice_table(&invoices).await?;
        self.log_embeds();

        self.run_state.save(now);
        tracing::info!("Report generation completed successfully!");

        Ok(ReportSummary {
            start,
            end,
            invoice_count: invoices.len(),
            total_sales,
            total_tax,
            cells_written,
            chart,
        })
    }

    fn log_embeds(&self) {
        if !self.spreadsheet_id.is_empty() {
            let src = format!(
                "https://docs.google.com/spreadsheets/d/{}/preview?rm=minimal",
                self.spreadsheet_id
            );
            tracing::info!("Embeddable iframe code for CRM (sheet):");
            tracing::info!("{}", RULE);
            tracing::info!("{}", embed_snippet(&src));
        }
        if !self.chart_page_url.is_empty() {
            tracing::info!("Embeddable iframe code for CRM (chart):");
            tracing::info!("{}", RULE);
            tracing::info!("{}", embed_snippet(&self.chart_page_url));
        }
    }
}

/// 逐张输出发票明细与合计, 返回 (销售额合计, 税额合计)
fn log_invoices(invoices: &[Invoice]) -> (BigDecimal, BigDecimal) {
    let mut total_sales = BigDecimal::zero();
    let mut total_tax = BigDecimal::zero();

    tracing::info!("Paid Invoices:");
    tracing::info!("{}", RULE);
    for invoice in invoices {
        tracing::info!("Invoice #{}", invoice.invoice_number);
        tracing::info!("Date: {}", invoice.issue_day());
        tracing::info!("Customer: {}", invoice.customer_name);
        tracing::info!("Subtotal: {}", format_currency(Some(&invoice.subtotal)));
        tracing::info!("Sales Tax: {}", format_currency(Some(&invoice.tax)));
        tracing::info!("Total: {}", format_currency(Some(&invoice.total)));
        tracing::info!("{}", &RULE[..40]);

        total_sales += &invoice.subtotal;
        total_tax += &invoice.tax;
    }

    let revenue = &total_sales + &total_tax;
    tracing::info!("=== Summary ===");
    tracing::info!("Total Sales: {}", format_currency(Some(&total_sales)));
    tracing::info!("Total Sales Tax: {}", format_currency(Some(&total_tax)));
    tracing::info!("Total Revenue: {}", format_currency(Some(&revenue)));

    (total_sales, total_tax)
}
