//! 梱包写真のアップロード
//!
//! unsigned preset による multipart アップロード。成功時は
//! `secure_url` と `public_id` を含むJSONが返る。

use super::{error_from_response, http_client, map_send_error};
use crate::config::Config;
use crate::error::{FastPackError, Result};
use async_trait::async_trait;
use fastpack_common::PackedPhoto;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// アップロード結果（フィールド欠落もあり得る）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub secure_url: Option<String>,
    pub public_id: Option<String>,
}

impl UploadResponse {
    /// 両フィールドが揃っている場合のみ写真情報に変換
    pub fn into_packed_photo(self) -> Result<PackedPhoto> {
        match (self.secure_url, self.public_id) {
            (Some(url), Some(public_id)) => Ok(PackedPhoto { url, public_id }),
            (url, public_id) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("secure_url");
                }
                if public_id.is_none() {
                    missing.push("public_id");
                }
                Err(FastPackError::Upload(format!(
                    "レスポンスに {} がありません",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// 写真ストレージ
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn upload(&self, photo: &Path) -> Result<UploadResponse>;
}

pub struct CloudinaryStorage {
    http: reqwest::Client,
    endpoint: String,
    upload_preset: String,
    folder: String,
}

impl CloudinaryStorage {
    pub fn new(
        endpoint: impl Into<String>,
        upload_preset: impl Into<String>,
        folder: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint: endpoint.into(),
            upload_preset: upload_preset.into(),
            folder: folder.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.upload_endpoint()?,
            config.upload_preset.clone(),
            config.upload_folder.clone(),
            config.timeout(),
        )
    }
}

#[async_trait]
impl PhotoStorage for CloudinaryStorage {
    async fn upload(&self, photo: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo.jpg".to_string());
        debug!("upload {} ({} bytes) -> {}", file_name, bytes.len(), self.endpoint);

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(match error_from_response(response).await {
                FastPackError::Api { status, message } => {
                    FastPackError::Upload(format!("[{}] {}", status, message))
                }
                other => other,
            });
        }

        response.json().await.map_err(map_send_error)
    }
}
