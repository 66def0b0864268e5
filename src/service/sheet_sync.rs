//! 表格同步: 整块覆盖写入, 不做局部单元格修改
//!
//! 表格没有事务, 中途失败时已写入的部分不会回滚。

use super::normalizer::format_currency;
use crate::client::{a1, fit_rows, SheetsApi};
use crate::error::SyncError;
use crate::models::{Invoice, SheetRow};
use std::sync::Arc;

pub const INVOICE_HEADER: [&str; 7] = [
    "Invoice Number",
    "Date",
    "Customer",
    "Subtotal",
    "Sales Tax",
    "Total",
    "Status",
];

/// 发票 -> 表格行
pub fn invoice_row(invoice: &Invoice) -> SheetRow {
    vec![
        invoice.invoice_number.clone(),
        invoice.issue_day(),
        invoice.customer_name.clone(),
        format_currency(Some(&invoice.subtotal)),
        format_currency(Some(&invoice.tax)),
        format_currency(Some(&invoice.total)),
        invoice.status.to_string(),
    ]
}

pub struct SheetSynchronizer {
    sheets: Arc<dyn SheetsApi>,
    worksheet: String,
    invoice_range: String,
}

impl SheetSynchronizer {
    pub fn new(sheets: Arc<dyn SheetsApi>, worksheet: impl Into<String>, invoice_range: impl Into<String>) -> Self {
        Self {
            sheets,
            worksheet: worksheet.into(),
            invoice_range: invoice_range.into(),
        }
    }

    pub fn sheets(&self) -> &Arc<dyn SheetsApi> {
        &self.sheets
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    /// 清空发票区域后写入表头 + 每张发票一行, 返回写入的单元格数
    pub async fn write_invoice_table(&self, invoices: &[Invoice]) -> Result<usize, SyncError> {
        let mut values: Vec<SheetRow> = Vec::with_capacity(invoices.len() + 1);
        values.push(INVOICE_HEADER.iter().map(|h| h.to_string()).collect());
        values.extend(invoices.iter().map(invoice_row));

        // 配置的区域行数不够时先扩大, 避免清空后写入越界
        let range = a1(&self.worksheet, &fit_rows(&self.invoice_range, values.len()));
        self.sheets.clear_range(&range).await?;
        let updated = self.sheets.update_range(&range, &values).await?;

        tracing::info!("Updated {} cells in {}", updated, range);
        Ok(updated)
    }

    /// 删除同名页签 (如果存在) 后重建, 从 A1 开始写入表头 + 数据
    pub async fn recreate_derived_sheet(
        &self,
        name: &str,
        header: &[String],
        rows: &[SheetRow],
    ) -> Result<usize, SyncError> {
        let existing = self
            .sheets
            .list_sheets()
            .await?
            .into_iter()
            .find(|s| s.title == name);

        if let Some(sheet) = existing {
            tracing::info!("Deleting existing sheet {:?} (id {})", name, sheet.sheet_id);
            self.sheets.delete_sheet(sheet.sheet_id).await?;
        }

        let created = self.sheets.add_sheet(name).await?;
        tracing::info!("Created sheet {:?} (id {})", created.title, created.sheet_id);

        let mut values: Vec<SheetRow> = Vec::with_capacity(rows.len() + 1);
        values.push(header.to_vec());
        values.extend(rows.iter().cloned());

        let updated = self.sheets.update_range(&a1(name, "A1"), &values).await?;
        tracing::info!("Sheet {:?} populated with {} cells", name, updated);
        Ok(updated)
    }
}
