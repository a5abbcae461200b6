//! 出荷APIクライアント
//!
//! `api/shipments` 系エンドポイントを叩く。保存済みトークンがあれば
//! Bearer ヘッダを付与する。

use super::{error_from_response, http_client, map_send_error, ShipmentBackend};
use crate::config::Config;
use crate::error::{FastPackError, Result};
use async_trait::async_trait;
use fastpack_common::{ShipmentId, ShipmentQuery, ShipmentRecord};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http: http_client(timeout)?,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url(), config.token(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.authorize(request).send().await.map_err(map_send_error)
    }

    async fn fetch_list(&self, request: reqwest::RequestBuilder) -> Result<Vec<ShipmentRecord>> {
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body = response.text().await.map_err(map_send_error)?;
        parse_body::<Vec<ShipmentRecord>>(&body)?.ok_or_else(|| FastPackError::Api {
            status: StatusCode::OK.as_u16(),
            message: "サーバーから空のレスポンスが返されました".into(),
        })
    }
}

/// 本文をパース（空白のみなら None）
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    if body.trim().is_empty() || body.trim() == "null" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

#[async_trait]
impl ShipmentBackend for ApiClient {
    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<ShipmentRecord>> {
        debug!("GET shipment {}", id);
        let response = self
            .send(self.http.get(self.url(&format!("shipments/{}", id))))
            .await
            .inspect_err(|e| error!("出荷取得に失敗 (ID {}): {}", id, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("shipment {} not found", id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await.map_err(map_send_error)?;
        parse_body(&body)
    }

    async fn update_shipment(&self, shipment: &ShipmentRecord) -> Result<Option<ShipmentRecord>> {
        debug!("PUT shipment {}", shipment.id);
        let response = self
            .send(
                self.http
                    .put(self.url(&format!("shipments/{}", shipment.id)))
                    .json(shipment),
            )
            .await
            .inspect_err(|e| error!("出荷更新に失敗 (ID {}): {}", shipment.id, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await.map_err(map_send_error)?;
        parse_body(&body)
    }

    async fn shipments_for_packing(&self) -> Result<Vec<ShipmentRecord>> {
        debug!("GET shipments/for-packing");
        self.fetch_list(self.http.get(self.url("shipments/for-packing")))
            .await
    }

    async fn find_shipments(&self, query: &ShipmentQuery) -> Result<Vec<ShipmentRecord>> {
        let pairs = query.to_pairs();
        debug!("GET shipments {:?}", pairs);
        self.fetch_list(self.http.get(self.url("shipments")).query(&pairs))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let client = ApiClient::new("http://localhost:3000/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("shipments/1"), "http://localhost:3000/api/shipments/1");
        assert_eq!(client.url("/shipments"), "http://localhost:3000/api/shipments");
    }

    #[test]
    fn test_parse_body_empty() {
        assert!(parse_body::<ShipmentRecord>("").unwrap().is_none());
        assert!(parse_body::<ShipmentRecord>("  \n").unwrap().is_none());
        assert!(parse_body::<ShipmentRecord>("null").unwrap().is_none());
    }

    #[test]
    fn test_parse_body_record() {
        let record = parse_body::<ShipmentRecord>(r#"{"_id": 41234567890}"#).unwrap().unwrap();
        assert_eq!(record.id, ShipmentId(41234567890));
    }

    #[test]
    fn test_parse_body_invalid() {
        let result = parse_body::<ShipmentRecord>("{broken");
        assert!(matches!(result, Err(FastPackError::JsonParse(_))));
    }
}
