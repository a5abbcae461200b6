//! バックエンドAPI連携
//!
//! - client: 出荷API（取得/検索/梱包待ち一覧/更新）
//! - auth: ログイン/登録
//! - storage: 梱包写真のアップロード

mod auth;
mod client;
mod storage;

pub use auth::AuthClient;
pub use client::ApiClient;
pub use storage::{CloudinaryStorage, PhotoStorage, UploadResponse};

use crate::error::{FastPackError, Result};
use async_trait::async_trait;
use fastpack_common::{ShipmentId, ShipmentQuery, ShipmentRecord};
use std::time::Duration;

/// 出荷レコードの取得/更新を行うバックエンド
#[async_trait]
pub trait ShipmentBackend: Send + Sync {
    /// IDで1件取得（存在しなければ `Ok(None)`）
    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<ShipmentRecord>>;

    /// レコード全体を送信して更新（空レスポンスは `Ok(None)`）
    async fn update_shipment(&self, shipment: &ShipmentRecord) -> Result<Option<ShipmentRecord>>;

    /// 梱包待ちの出荷一覧
    async fn shipments_for_packing(&self) -> Result<Vec<ShipmentRecord>>;

    /// 条件検索
    async fn find_shipments(&self, query: &ShipmentQuery) -> Result<Vec<ShipmentRecord>>;
}

/// タイムアウト付きHTTPクライアントを生成
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("fastpack/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(FastPackError::Http)
}

/// 送信エラーをタイムアウトとそれ以外に振り分け
pub(crate) fn map_send_error(err: reqwest::Error) -> FastPackError {
    if err.is_timeout() {
        FastPackError::Timeout
    } else {
        FastPackError::Http(err)
    }
}

/// 失敗レスポンスをエラーに変換
///
/// 本文が空でなければ本文を、空ならステータスをメッセージにする。
pub(crate) async fn error_from_response(response: reqwest::Response) -> FastPackError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .map(|reason| format!("{} {}", status.as_u16(), reason))
            .unwrap_or_else(|| status.as_u16().to_string())
    } else {
        body
    };
    FastPackError::Api {
        status: status.as_u16(),
        message,
    }
}
