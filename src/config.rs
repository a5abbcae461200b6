use crate::error::{FastPackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOKEN_ENV: &str = "FASTPACK_TOKEN";
const BASE_URL_ENV: &str = "FASTPACK_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// バックエンドのベースURL（`api/` の手前まで）
    pub base_url: String,
    pub auth_token: Option<String>,
    /// 写真ストレージのアップロードURL（cloud名の手前まで）
    pub upload_url: String,
    pub cloud_name: Option<String>,
    pub upload_preset: String,
    pub upload_folder: String,
    /// 梱包写真の保存先フォルダ（最新の写真を自動選択）
    pub capture_folder: Option<PathBuf>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FastPackError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fastpack").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".into(),
            auth_token: None,
            upload_url: "https://api.cloudinary.com/v1_1".into(),
            cloud_name: None,
            upload_preset: "FastPackApp".into(),
            upload_folder: "packing".into(),
            capture_folder: None,
            timeout_seconds: 30,
        }
    }

    pub fn base_url(&self) -> String {
        // 環境変数を優先
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => self.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 保存済みトークン（環境変数を優先）
    pub fn token(&self) -> Option<String> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            _ => self.auth_token.clone(),
        }
    }

    pub fn require_token(&self) -> Result<String> {
        self.token().ok_or(FastPackError::NotLoggedIn)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    /// 写真アップロード先エンドポイント
    pub fn upload_endpoint(&self) -> Result<String> {
        let cloud = self.cloud_name.as_deref().ok_or_else(|| {
            FastPackError::Config(
                "cloud名が未設定です。`fastpack config --cloud-name NAME` で設定してください".into(),
            )
        })?;
        Ok(format!(
            "{}/{}/image/upload",
            self.upload_url.trim_end_matches('/'),
            cloud
        ))
    }

    pub fn set_token(&mut self, token: String) -> Result<()> {
        self.auth_token = Some(token);
        self.save()
    }

    pub fn clear_token(&mut self) -> Result<()> {
        self.auth_token = None;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.upload_preset, "FastPackApp");
        assert_eq!(config.upload_folder, "packing");
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.auth_token = Some("tok".into());
        config.cloud_name = Some("demo".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.auth_token.as_deref(), Some("tok"));
        assert_eq!(loaded.cloud_name.as_deref(), Some("demo"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://10.0.0.5:3000/"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:3000/");
        assert_eq!(config.upload_preset, "FastPackApp");
    }

    #[test]
    fn test_upload_endpoint() {
        let mut config = Config::default();
        assert!(matches!(config.upload_endpoint(), Err(FastPackError::Config(_))));

        config.cloud_name = Some("demo".into());
        assert_eq!(
            config.upload_endpoint().unwrap(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_timeout_never_zero() {
        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
