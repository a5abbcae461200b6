//! ログイン/登録
//!
//! 成功レスポンスにトークンが含まれない場合もエラーとして扱う。
//! トークンの保存は呼び出し側（Config）で行う。

use super::{error_from_response, http_client, map_send_error};
use crate::config::Config;
use crate::error::{FastPackError, Result};
use fastpack_common::{AuthResponse, Credentials};
use std::time::Duration;
use tracing::{debug, warn};

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url(), config.timeout())
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.post("login", credentials).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.post("register", credentials).await
    }

    async fn post(&self, action: &str, credentials: &Credentials) -> Result<AuthResponse> {
        let url = format!("{}/api/auth/{}", self.base_url, action);
        debug!("POST {} ({})", url, credentials.email);

        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!("{} に失敗: {}", action, err);
            return Err(match err {
                FastPackError::Api { message, .. } => FastPackError::Auth(message),
                other => other,
            });
        }

        let body = response.text().await.map_err(map_send_error)?;
        if body.trim().is_empty() {
            return Err(FastPackError::Auth("成功レスポンスの本文が空です".into()));
        }

        let auth: AuthResponse = serde_json::from_str(&body)?;
        match auth.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(auth),
            _ => Err(FastPackError::Auth(
                "サーバーからトークンが返されませんでした".into(),
            )),
        }
    }
}
