use serde::{Deserialize, Serialize};

/// chart_data.json 中的一项 (报表路径, 最近月份在前)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub month: String,
    pub tax: f64,
}

/// /api/chart-data 返回的一项 (按时间升序)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub month: String,
    pub total: f64,
}
