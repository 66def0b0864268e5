use super::credentials::load_access_token;
use crate::config::SheetsConfig;
use crate::error::SyncError;
use crate::models::{SheetProperties, SheetRow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

/// 表格数据源: 一个电子表格下的若干页签, 区域用 A1 记法寻址
#[async_trait]
pub trait SheetsApi: Send + Sync {
    async fn get_range(&self, range: &str) -> Result<Vec<SheetRow>, SyncError>;

    async fn clear_range(&self, range: &str) -> Result<(), SyncError>;

    /// 从区域左上角开始整块写入, 返回写入的单元格数
    async fn update_range(&self, range: &str, rows: &[SheetRow]) -> Result<usize, SyncError>;

    async fn list_sheets(&self) -> Result<Vec<SheetProperties>, SyncError>;

    async fn add_sheet(&self, title: &str) -> Result<SheetProperties, SyncError>;

    async fn delete_sheet(&self, sheet_id: i64) -> Result<(), SyncError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [SheetRow],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_cells: usize,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<serde_json::Value>,
}

/// 访问令牌来源
#[derive(Debug, Clone)]
enum TokenSource {
    Static(String),
    /// 每次请求重新读取, 外部刷新后的令牌无需重启即可生效
    File(PathBuf),
}

/// Google Sheets v4 REST 客户端
pub struct GoogleSheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    token: TokenSource,
}

impl GoogleSheetsClient {
    pub fn new(http: Client, config: &SheetsConfig, access_token: String) -> Result<Self, SyncError> {
        Self::with_token(http, config, TokenSource::Static(access_token))
    }

    /// 按配置创建: 配置了 access_token 就直接用, 否则按请求读取令牌文件
    pub fn from_config(http: Client, config: &SheetsConfig) -> Result<Self, SyncError> {
        let token = match config.access_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => TokenSource::Static(token.to_string()),
            None => TokenSource::File(config.token_file.clone()),
        };
        Self::with_token(http, config, token)
    }

    fn with_token(http: Client, config: &SheetsConfig, token: TokenSource) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SyncError::Decode(format!("invalid sheets base url: {}", e)))?;
        Ok(Self {
            http,
            base_url,
            spreadsheet_id: config.spreadsheet_id.clone(),
            token,
        })
    }

    fn access_token(&self) -> Result<String, SyncError> {
        match &self.token {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::File(path) => Ok(load_access_token(None, path)?),
        }
    }

    /// {base}/{spreadsheetId}/{segments...}, 每段单独做百分号编码
    fn url(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SyncError::Decode("sheets base url cannot be a base".to_string()))?;
            path.pop_if_empty().push(&self.spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        let response = request.bearer_auth(self.access_token()?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn batch_update(&self, request: serde_json::Value) -> Result<BatchUpdateResponse, SyncError> {
        let url = self.url(&[])?;
        let url = Url::parse(&format!("{}:batchUpdate", url))
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        self.send(self.http.post(url).json(&json!({ "requests": [request] })))
            .await
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn get_range(&self, range: &str) -> Result<Vec<SheetRow>, SyncError> {
        let url = self.url(&["values", range])?;
        let value_range: ValueRange = self.send(self.http.get(url)).await?;
        Ok(value_range.values)
    }

    async fn clear_range(&self, range: &str) -> Result<(), SyncError> {
        let target = format!("{}:clear", range);
        let url = self.url(&["values", target.as_str()])?;
        let _: serde_json::Value = self.send(self.http.post(url).json(&json!({}))).await?;
        Ok(())
    }

    async fn update_range(&self, range: &str, rows: &[SheetRow]) -> Result<usize, SyncError> {
        let url = self.url(&["values", range])?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let response: UpdateValuesResponse = self
            .send(
                self.http
                    .put(url)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body),
            )
            .await?;
        Ok(response.updated_cells)
    }

    async fn list_sheets(&self) -> Result<Vec<SheetProperties>, SyncError> {
        let url = self.url(&[])?;
        let spreadsheet: Spreadsheet = self
            .send(
                self.http
                    .get(url)
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await?;
        Ok(spreadsheet.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<SheetProperties, SyncError> {
        let response = self
            .batch_update(json!({ "addSheet": { "properties": { "title": title } } }))
            .await?;

        let properties = response
            .replies
            .into_iter()
            .next()
            .and_then(|reply| reply.get("addSheet")?.get("properties").cloned())
            .ok_or_else(|| SyncError::Decode("addSheet reply missing properties".to_string()))?;
        serde_json::from_value(properties).map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn delete_sheet(&self, sheet_id: i64) -> Result<(), SyncError> {
        self.batch_update(json!({ "deleteSheet": { "sheetId": sheet_id } }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn client() -> GoogleSheetsClient {
        let mut config = AppConfig::default().sheets;
        config.spreadsheet_id = "abc123".to_string();
        GoogleSheetsClient::new(Client::new(), &config, "token".to_string()).unwrap()
    }

    #[test]
    fn test_range_is_percent_encoded() {
        let url = client().url(&["values", "'copy of reformatted'!A:D"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'copy%20of%20reformatted'!A:D"
        );
    }

    #[test]
    fn test_token_file_is_read_per_request() {
        let mut config = AppConfig::default().sheets;
        config.token_file = std::env::temp_dir().join("sales-tax-sync-sheets-missing-token.json");
        let client = GoogleSheetsClient::from_config(Client::new(), &config).unwrap();
        assert!(matches!(client.access_token(), Err(SyncError::Credentials(_))));

        config.access_token = Some("configured".to_string());
        let client = GoogleSheetsClient::from_config(Client::new(), &config).unwrap();
        assert_eq!(client.access_token().unwrap(), "configured");
    }

    #[test]
    fn test_spreadsheet_url() {
        let url = client().url(&[]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123");
    }
}
