//! 写真アップロード → 出荷更新 の2段階処理
//!
//! 自動リトライはしない。再実行は常にアップロードからやり直す。

use crate::api::{PhotoStorage, ShipmentBackend};
use crate::error::{FastPackError, Result};
use fastpack_common::ShipmentRecord;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// アップロード失敗（バックエンドは呼ばれていない）
    UploadFailed { reason: String },
    /// サーバーが返した更新後レコード
    Persisted(ShipmentRecord),
    /// 写真は付いたが保存に失敗
    PersistFailed {
        local_record: ShipmentRecord,
        reason: String,
    },
}

impl ConfirmOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, ConfirmOutcome::Persisted(_))
    }
}

pub struct PhotoUploadCoordinator {
    backend: Arc<dyn ShipmentBackend>,
    storage: Arc<dyn PhotoStorage>,
    timeout: Duration,
}

impl PhotoUploadCoordinator {
    pub fn new(
        backend: Arc<dyn ShipmentBackend>,
        storage: Arc<dyn PhotoStorage>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            storage,
            timeout,
        }
    }

    pub async fn confirm(&self, record: &ShipmentRecord, local_photo: &Path) -> ConfirmOutcome {
        let photo = match self
            .bounded(self.storage.upload(local_photo))
            .await
            .and_then(|response| response.into_packed_photo())
        {
            Ok(photo) => photo,
            Err(e) => {
                warn!("写真アップロードに失敗 (ID {}): {}", record.id, e);
                return ConfirmOutcome::UploadFailed {
                    reason: e.to_string(),
                };
            }
        };
        info!("uploaded {} as {}", local_photo.display(), photo.public_id);

        let local_record = record.with_photo(photo);
        match self.bounded(self.backend.update_shipment(&local_record)).await {
            Ok(Some(server_record)) => {
                info!("shipment {} persisted", server_record.id);
                ConfirmOutcome::Persisted(server_record)
            }
            Ok(None) => {
                warn!("出荷更新のレスポンスが空です (ID {})", record.id);
                ConfirmOutcome::PersistFailed {
                    local_record,
                    reason: "サーバーからレコードが返されませんでした".into(),
                }
            }
            Err(e) => {
                warn!("出荷更新に失敗 (ID {}): {}", record.id, e);
                ConfirmOutcome::PersistFailed {
                    local_record,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(FastPackError::Timeout))
    }
}
