use serde::{Deserialize, Serialize};

/// 一行单元格, 只能整块覆盖写入
pub type SheetRow = Vec<String>;

/// 页签属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}
