use super::aggregator::MonthlyAggregate;
use super::normalizer::to_cents_f64;
use crate::error::ExportError;
use crate::models::ChartEntry;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use std::path::{Path, PathBuf};

/// 图表数据落盘 (chart_data.json), 每次整体覆盖
pub struct ChartExporter {
    path: PathBuf,
    top_months: usize,
}

impl ChartExporter {
    pub fn new(path: impl Into<PathBuf>, top_months: usize) -> Self {
        Self {
            path: path.into(),
            top_months,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入最近 N 个月的汇总 (新的在前)
    pub fn export_chart_data(&self, aggregate: &MonthlyAggregate) -> Result<Vec<ChartEntry>, ExportError> {
        let entries: Vec<ChartEntry> = aggregate
            .most_recent(self.top_months)
            .into_iter()
            .map(|(month, tax)| ChartEntry {
                month: month.label(),
                tax: to_cents_f64(&tax),
            })
            .collect();

        let json = serde_json::to_string(&entries)?;
        std::fs::write(&self.path, json).map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!("Chart data ({} months) written to {}", entries.len(), self.path.display());
        Ok(entries)
    }
}

/// 上次成功运行时间 (last_run.txt, ISO 8601)
///
/// 只用于日志, 拉取窗口始终是固定的回看天数。
pub struct RunStateStore {
    path: PathBuf,
}

impl RunStateStore {
    /// 文件缺失或无法解析时的默认回看
    const DEFAULT_LOOKBACK_DAYS: i64 = 90;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self, now: DateTime<Local>) -> DateTime<Local> {
        let fallback = now - Duration::days(Self::DEFAULT_LOOKBACK_DAYS);

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No previous run recorded in {}, assuming {}",
                    self.path.display(),
                    fallback.format("%Y-%m-%d %H:%M:%S")
                );
                return fallback;
            }
            Err(e) => {
                tracing::error!("Error loading last run time: {}", e);
                return fallback;
            }
        };

        match parse_timestamp(raw.trim()) {
            Some(ts) => ts,
            None => {
                tracing::error!("Error loading last run time: invalid timestamp {:?}", raw.trim());
                fallback
            }
        }
    }

    pub fn save(&self, now: DateTime<Local>) {
        if let Err(e) = std::fs::write(&self.path, now.to_rfc3339()) {
            tracing::error!("Error saving last run time: {}", e);
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local));
    }
    // 无时区的本地时间, 如 2024-03-01T01:00:00.123456
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::aggregator::{aggregate_by_month, TaxEntry};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sales-tax-sync-export-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_export_top_three_months() {
        let rows: Vec<TaxEntry> = [
            ("2024-01-10", "10"),
            ("2024-02-10", "20"),
            ("2024-03-10", "30.005"),
            ("2024-04-10", "40"),
            ("2024-04-20", "2.5"),
        ]
        .iter()
        .map(|(d, t)| TaxEntry::new(*d, BigDecimal::from_str(t).unwrap()))
        .collect();

        let path = temp_path("chart.json");
        let exporter = ChartExporter::new(&path, 3);
        let entries = exporter.export_chart_data(&aggregate_by_month(&rows)).unwrap();

        assert_eq!(
            entries,
            vec![
                ChartEntry { month: "April 2024".to_string(), tax: 42.5 },
                ChartEntry { month: "March 2024".to_string(), tax: 30.01 },
                ChartEntry { month: "February 2024".to_string(), tax: 20.0 },
            ]
        );

        let on_disk: Vec<ChartEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, entries);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_empty_aggregate_writes_empty_list() {
        let path = temp_path("empty.json");
        std::fs::write(&path, r#"[{"month":"March 2024","tax":1.0}]"#).unwrap();

        ChartExporter::new(&path, 3)
            .export_chart_data(&MonthlyAggregate::new())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_run_state_round_trip_and_fallback() {
        let path = temp_path("last_run.txt");
        let store = RunStateStore::new(&path);
        let now = Local::now();

        std::fs::remove_file(&path).ok();
        assert_eq!(store.load(now), now - Duration::days(90));

        store.save(now);
        assert_eq!(store.load(Local::now()).timestamp(), now.timestamp());

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(store.load(now), now - Duration::days(90));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_run_state_unreadable_path_falls_back() {
        let now = Local::now();
        let store = RunStateStore::new(std::env::temp_dir());
        assert_eq!(store.load(now), now - Duration::days(90));
    }

    #[test]
    fn test_parse_naive_timestamp() {
        assert!(parse_timestamp("2024-03-01T01:00:00.123456").is_some());
        assert!(parse_timestamp("2024-03-01T01:00:00+00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
