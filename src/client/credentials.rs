use crate::error::CredentialsError;
use serde_json::Value;
use std::path::Path;

fn read_json(path: &Path) -> Result<Value, CredentialsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CredentialsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// 从 OAuth 客户端凭据文件 (credentials.json) 读取 `installed.client_id`
pub fn read_client_id(path: &Path) -> Result<String, CredentialsError> {
    read_json(path)?
        .get("installed")
        .and_then(|installed| installed.get("client_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CredentialsError::MissingField {
            path: path.to_path_buf(),
            field: "installed.client_id",
        })
}

/// Sheets 访问令牌: 优先使用配置中的值, 否则读取令牌文件中的 `access_token` / `token`
pub fn load_access_token(configured: Option<&str>, token_file: &Path) -> Result<String, CredentialsError> {
    if let Some(token) = configured.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let token = read_json(token_file)?;
    ["access_token", "token"]
        .iter()
        .find_map(|key| token.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| CredentialsError::MissingField {
            path: token_file.to_path_buf(),
            field: "access_token",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sales-tax-sync-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_client_id() {
        let path = temp_file(
            "credentials.json",
            r#"{"installed": {"client_id": "123.apps.googleusercontent.com", "client_secret": "s"}}"#,
        );
        assert_eq!(read_client_id(&path).unwrap(), "123.apps.googleusercontent.com");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_client_id_errors() {
        let missing = std::env::temp_dir().join("sales-tax-sync-does-not-exist.json");
        assert!(matches!(read_client_id(&missing), Err(CredentialsError::Read { .. })));

        let garbage = temp_file("garbage.json", "not json");
        assert!(matches!(read_client_id(&garbage), Err(CredentialsError::Parse { .. })));
        std::fs::remove_file(garbage).ok();

        let web = temp_file("web.json", r#"{"web": {"client_id": "x"}}"#);
        assert!(matches!(read_client_id(&web), Err(CredentialsError::MissingField { .. })));
        std::fs::remove_file(web).ok();
    }

    #[test]
    fn test_load_access_token_prefers_config() {
        let missing = std::env::temp_dir().join("sales-tax-sync-no-token.json");
        assert_eq!(load_access_token(Some("abc"), &missing).unwrap(), "abc");
        assert!(load_access_token(Some(""), &missing).is_err());

        let file = temp_file("token.json", r#"{"token": "from-file", "refresh_token": "r"}"#);
        assert_eq!(load_access_token(None, &file).unwrap(), "from-file");
        std::fs::remove_file(file).ok();
    }
}
