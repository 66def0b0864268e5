//! 按自然月汇总销售税
//!
//! 报表、派生页签和图表服务三处都走这里, 保证同一个月无论日期写法如何
//! 都落到同一个 key 上。

use super::normalizer::parse_date;
use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

/// 月份 key: (年, 月), 展示为 "March 2024"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// 一条待汇总记录: 原始日期文本 + 税额
#[derive(Debug, Clone)]
pub struct TaxEntry {
    pub date: String,
    pub tax: BigDecimal,
}

impl TaxEntry {
    pub fn new(date: impl Into<String>, tax: BigDecimal) -> Self {
        Self {
            date: date.into(),
            tax,
        }
    }
}

/// 月度汇总结果, 每次运行全量重算
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAggregate {
    totals: BTreeMap<MonthKey, BigDecimal>,
}

impl MonthlyAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, date: NaiveDate, tax: &BigDecimal) {
        let entry = self
            .totals
            .entry(MonthKey::from_date(date))
            .or_insert_with(BigDecimal::zero);
        *entry += tax;
    }

    pub fn get(&self, key: &MonthKey) -> Option<&BigDecimal> {
        self.totals.get(key)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// 最近的 n 个月, 新的在前 (报表 / chart_data.json)
    pub fn most_recent(&self, n: usize) -> Vec<(MonthKey, BigDecimal)> {
        self.totals
            .iter()
            .rev()
            .take(n)
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }

    /// 全部月份, 新的在前
    pub fn descending(&self) -> Vec<(MonthKey, BigDecimal)> {
        self.most_recent(self.totals.len())
    }

    /// 全部月份, 按时间升序 (图表接口)
    pub fn chronological(&self) -> Vec<(MonthKey, BigDecimal)> {
        self.totals.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    /// 以 "Month YYYY" 为 key 的视图
    pub fn by_label(&self) -> BTreeMap<String, BigDecimal> {
        self.totals
            .iter()
            .map(|(k, v)| (k.label(), v.clone()))
            .collect()
    }
}

/// 按月汇总; 日期解析失败的行记 warn 后跳过
pub fn aggregate_by_month<'a, I>(rows: I) -> MonthlyAggregate
where
    I: IntoIterator<Item = &'a TaxEntry>,
{
    aggregate_by_month_where(rows, |_| true)
}

/// 同 [`aggregate_by_month`], 只累计 `keep(date)` 为真的行
pub fn aggregate_by_month_where<'a, I, F>(rows: I, keep: F) -> MonthlyAggregate
where
    I: IntoIterator<Item = &'a TaxEntry>,
    F: Fn(NaiveDate) -> bool,
{
    let mut aggregate = MonthlyAggregate::new();
    let mut skipped = 0usize;

    for row in rows {
        match parse_date(&row.date) {
            Ok(date) if keep(date) => aggregate.add(date, &row.tax),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Skipping row: {}", e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{} rows skipped while aggregating by month", skipped);
    }
    aggregate
}
