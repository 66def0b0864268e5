use super::aggregator::{aggregate_by_month_where, TaxEntry};
use super::normalizer::{parse_currency, to_cents_f64};
use crate::client::SheetsApi;
use crate::error::SyncError;
use crate::models::{ChartPoint, SheetRow};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

const DATE_COLUMN: usize = 1;
const TAX_COLUMN: usize = 3;

/// 图表接口的数据源: 直接从派生页签重算, 不读 chart_data.json
pub struct ChartSource {
    sheets: Arc<dyn SheetsApi>,
    range: String,
    window_days: i64,
}

impl ChartSource {
    pub fn new(sheets: Arc<dyn SheetsApi>, range: impl Into<String>, window_days: i64) -> Self {
        Self {
            sheets,
            range: range.into(),
            window_days,
        }
    }

    /// 最近 window_days 天内的月度税额, 按时间升序
    pub async fn serve_chart_data(&self, today: NaiveDate) -> Result<Vec<ChartPoint>, SyncError> {
        let values = self.sheets.get_range(&self.range).await?;
        Ok(chart_points(&values, today - Duration::days(self.window_days)))
    }
}

/// 只统计 cutoff 之后的日期 (cutoff 当天不算); 跳过表头, 列数不足或税额无法解析的行跳过
pub fn chart_points(values: &[SheetRow], cutoff: NaiveDate) -> Vec<ChartPoint> {
    let entries: Vec<TaxEntry> = values
        .iter()
        .skip(1)
        .filter(|row| row.len() > TAX_COLUMN)
        .filter_map(|row| match parse_currency(&row[TAX_COLUMN]) {
            Ok(tax) => Some(TaxEntry::new(row[DATE_COLUMN].clone(), tax)),
            Err(e) => {
                tracing::warn!("Error processing row: {}", e);
                None
            }
        })
        .collect();

    aggregate_by_month_where(&entries, |date| date > cutoff)
        .chronological()
        .into_iter()
        .map(|(month, total)| ChartPoint {
            month: month.label(),
            total: to_cents_f64(&total),
        })
        .collect()
}
