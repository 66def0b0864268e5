use super::aggregator::{aggregate_by_month, TaxEntry};
use super::fetcher::InvoiceFetcher;
use super::normalizer::{format_currency, parse_currency, parse_date};
use super::sheet_sync::SheetSynchronizer;
use crate::client::a1;
use crate::error::{AppError, SyncError};
use crate::models::{Invoice, SheetRow};
use bigdecimal::{BigDecimal, Zero};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// 源页签读取的列数 (日期在第 2 列)
const SOURCE_COLUMNS: usize = 3;
const DATE_COLUMN: usize = 1;

/// 开票日 -> 当日税额合计
pub fn daily_tax_lookup(invoices: &[Invoice]) -> HashMap<NaiveDate, BigDecimal> {
    let mut lookup: HashMap<NaiveDate, BigDecimal> = HashMap::new();
    for invoice in invoices {
        *lookup
            .entry(invoice.issue_date.date_naive())
            .or_insert_with(BigDecimal::zero) += &invoice.tax;
    }
    lookup
}

/// 源页签 -> 派生页签: 每行补齐 3 列, 追加 "Sales Tax" 列
pub fn reformat_rows(
    source: &[SheetRow],
    lookup: &HashMap<NaiveDate, BigDecimal>,
) -> Option<(SheetRow, Vec<SheetRow>)> {
    let (header, data) = source.split_first()?;
    if data.is_empty() {
        return None;
    }

    let mut new_header = header.clone();
    new_header.push("Sales Tax".to_string());

    let rows = data
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if row.len() < SOURCE_COLUMNS {
                row.resize(SOURCE_COLUMNS, String::new());
            }
            let tax = parse_date(&row[DATE_COLUMN]).ok().and_then(|d| lookup.get(&d));
            row.push(format_currency(tax));
            row
        })
        .collect();

    Some((new_header, rows))
}

/// 重建派生页签, 返回写入的单元格数
pub async fn reformat_sheet(
    fetcher: &InvoiceFetcher,
    sync: &SheetSynchronizer,
    derived_sheet: &str,
    lookback_days: i64,
    today: NaiveDate,
) -> Result<usize, AppError> {
    let invoices = fetcher
        .fetch_paid_invoices(today - Duration::days(lookback_days), today)
        .await?;
    let lookup = daily_tax_lookup(&invoices);

    let source_range = a1(sync.worksheet(), "A1:C");
    let source = sync.sheets().get_range(&source_range).await?;
    let (header, rows) = reformat_rows(&source, &lookup)
        .ok_or(SyncError::NoSourceData { range: source_range })?;

    let cells = sync.recreate_derived_sheet(derived_sheet, &header, &rows).await?;

    let entries: Vec<TaxEntry> = rows
        .iter()
        .filter_map(|row| {
            let tax = row.last().and_then(|cell| parse_currency(cell).ok())?;
            Some(TaxEntry::new(row[DATE_COLUMN].clone(), tax))
        })
        .collect();
    for (month, tax) in aggregate_by_month(&entries).descending() {
        tracing::info!("{}: {}", month, format_currency(Some(&tax)));
    }

    tracing::info!(
        "Sheet {:?} created and populated with actual sales tax values",
        derived_sheet
    );
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn row(cells: &[&str]) -> SheetRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn invoice(day: u32, tax: &str) -> Invoice {
        Invoice {
            id: String::new(),
            invoice_number: "1".to_string(),
            issue_date: Utc.with_ymd_and_hms(2024, 3, day, 15, 0, 0).unwrap(),
            customer_name: "Acme".to_string(),
            subtotal: BigDecimal::zero(),
            tax: BigDecimal::from_str(tax).unwrap(),
            total: BigDecimal::zero(),
            status: InvoiceStatus::Paid,
        }
    }

    #[test]
    fn test_daily_lookup_sums_same_day() {
        let lookup = daily_tax_lookup(&[invoice(1, "10"), invoice(1, "5.5"), invoice(2, "1")]);
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        assert_eq!(lookup[&day(1)], BigDecimal::from_str("15.5").unwrap());
        assert_eq!(lookup[&day(2)], BigDecimal::from(1));
    }

    #[test]
    fn test_reformat_rows() {
        let lookup = daily_tax_lookup(&[invoice(1, "1234.5")]);
        let source = vec![
            row(&["Invoice", "Date", "Customer"]),
            row(&["1001", "03/01/2024", "Acme"]),
            row(&["1002", "2024-03-02"]),
            row(&["1003", "soon", "Beta"]),
        ];

        let (header, rows) = reformat_rows(&source, &lookup).unwrap();
        assert_eq!(header, row(&["Invoice", "Date", "Customer", "Sales Tax"]));
        assert_eq!(
            rows,
            vec![
                row(&["1001", "03/01/2024", "Acme", "$1,234.50"]),
                row(&["1002", "2024-03-02", "", "$0.00"]),
                row(&["1003", "soon", "Beta", "$0.00"]),
            ]
        );
    }

    #[test]
    fn test_reformat_needs_data_rows() {
        let lookup = HashMap::new();
        assert!(reformat_rows(&[], &lookup).is_none());
        assert!(reformat_rows(&[row(&["Invoice", "Date"])], &lookup).is_none());
    }
}
