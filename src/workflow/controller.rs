//! スキャンワークフロー状態機械
//!
//! 権限 → スキャン → 取得 → 確認/写真 → 保存 の流れを管理する。
//! イベントは `&mut self` で1つずつ適用され、状態の変化は
//! `watch` チャネルで購読できる。

use super::coordinator::{ConfirmOutcome, PhotoUploadCoordinator};
use super::state::{ScanState, UploadOutcome, WorkflowSignal};
use crate::api::{PhotoStorage, ShipmentBackend};
use crate::config::Config;
use crate::error::{FastPackError, Result};
use crate::scanner::ScannerControl;
use fastpack_common::ShipmentId;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// 通信1回あたりの上限
    pub call_timeout: Duration,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            call_timeout: config.timeout(),
        }
    }
}

/// 別タスクから進行中の通信を中断するハンドル
#[derive(Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    scanner: Option<Arc<dyn ScannerControl>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(scanner) = &self.scanner {
            scanner.release();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct ScanWorkflowController {
    backend: Arc<dyn ShipmentBackend>,
    coordinator: PhotoUploadCoordinator,
    scanner: Option<Arc<dyn ScannerControl>>,
    options: WorkflowOptions,
    state_tx: watch::Sender<ScanState>,
    signal_tx: mpsc::UnboundedSender<WorkflowSignal>,
    signal_rx: Option<mpsc::UnboundedReceiver<WorkflowSignal>>,
    cancel_token: CancellationToken,
    last_code: Option<String>,
    closed: bool,
}

impl ScanWorkflowController {
    pub fn new(
        backend: Arc<dyn ShipmentBackend>,
        storage: Arc<dyn PhotoStorage>,
        options: WorkflowOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(ScanState::Idle);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let coordinator =
            PhotoUploadCoordinator::new(Arc::clone(&backend), storage, options.call_timeout);

        Self {
            backend,
            coordinator,
            scanner: None,
            options,
            state_tx,
            signal_tx,
            signal_rx: Some(signal_rx),
            cancel_token: CancellationToken::new(),
            last_code: None,
            closed: false,
        }
    }

    /// デコーダを接続（スキャン開始時にリセット、close時に解放）
    pub fn with_scanner(mut self, scanner: Arc<dyn ScannerControl>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// 中断ハンドル（`with_scanner` の後に取得すること）
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel_token.clone(),
            scanner: self.scanner.clone(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// 通知の受信側（最初の1回のみ取得できる）
    pub fn signals(&mut self) -> Option<mpsc::UnboundedReceiver<WorkflowSignal>> {
        self.signal_rx.take()
    }

    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.cancel_token.is_cancelled()
    }

    pub fn on_permission_result(&mut self, granted: bool) {
        if self.ignore_if_closed("permission") {
            return;
        }

        let current = self.state();
        if granted {
            match current {
                ScanState::Loading | ScanState::ShowResult { .. } => {
                    debug!("permission granted while {}; ignored", current);
                }
                ScanState::Scanning => {}
                _ => self.enter_scanning(),
            }
        } else {
            match current {
                ScanState::ShowResult { .. } => {
                    debug!("permission denied while showing result; ignored");
                }
                _ => {
                    warn!("カメラ/スキャナの使用が許可されていません");
                    self.transition(ScanState::RequestingPermission);
                }
            }
        }
    }

    pub async fn on_code_scanned(&mut self, code: &str) {
        if self.ignore_if_closed("scan") {
            return;
        }
        if !self.state_tx.borrow().is_scanning() {
            debug!("code {} arrived while {}; ignored", code, self.state());
            return;
        }

        self.last_code = Some(code.to_string());
        self.transition(ScanState::Loading);

        let id = match ShipmentId::parse(code) {
            Ok(id) => id,
            Err(_) => {
                warn!("出荷IDとして解釈できません: {}", code);
                self.transition(ScanState::Error {
                    message: FastPackError::InvalidIdentifier(code.to_string()).to_string(),
                });
                return;
            }
        };

        let backend = Arc::clone(&self.backend);
        match self.guarded(backend.get_shipment(id)).await {
            Ok(Some(record)) => {
                info!("shipment {} loaded", record.id);
                self.transition(ScanState::show_result(record));
            }
            Ok(None) => {
                info!("shipment {} not found", id);
                self.transition(ScanState::NoResult {
                    scanned_code: code.to_string(),
                });
            }
            Err(FastPackError::Cancelled) => {
                debug!("lookup of {} cancelled", id);
            }
            Err(e) => {
                warn!("出荷の取得に失敗 (ID {}): {}", id, e);
                self.transition(ScanState::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn retry(&mut self) {
        if self.ignore_if_closed("retry") {
            return;
        }
        match self.state() {
            ScanState::NoResult { .. }
            | ScanState::Error { .. }
            | ScanState::Idle
            | ScanState::RequestingPermission => self.enter_scanning(),
            other => debug!("retry while {}; ignored", other),
        }
    }

    pub fn capture_photo(&mut self, path: impl Into<PathBuf>) {
        self.set_pending_photo(Some(path.into()));
    }

    pub fn clear_photo(&mut self) {
        self.set_pending_photo(None);
    }

    /// 写真をアップロードして出荷を更新
    pub async fn confirm_photo(&mut self) -> Result<ConfirmOutcome> {
        if self.is_closed() {
            return Err(FastPackError::InvalidState("ワークフローは終了しています".into()));
        }

        let snapshot = self.state();
        let (record, photo) = match &snapshot {
            ScanState::ShowResult { uploading: true, .. } => {
                return Err(FastPackError::InvalidState("アップロード中です".into()));
            }
            ScanState::ShowResult {
                record,
                pending_photo: Some(photo),
                ..
            } => (record.clone(), photo.clone()),
            ScanState::ShowResult { .. } => {
                return Err(FastPackError::InvalidState("写真が選択されていません".into()));
            }
            other => {
                return Err(FastPackError::InvalidState(format!(
                    "出荷が表示されていません ({})",
                    other
                )));
            }
        };

        self.state_tx.send_modify(|state| {
            if let ScanState::ShowResult {
                uploading,
                upload_outcome,
                ..
            } = state
            {
                *uploading = true;
                *upload_outcome = None;
            }
        });

        let outcome = match self
            .cancellable(async { Ok(self.coordinator.confirm(&record, &photo).await) })
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("confirm of {} interrupted: {}", record.id, e);
                self.state_tx.send_replace(snapshot);
                return Err(e);
            }
        };

        match &outcome {
            ConfirmOutcome::UploadFailed { .. } => {
                self.state_tx.send_modify(|state| {
                    if let ScanState::ShowResult {
                        uploading,
                        upload_outcome,
                        ..
                    } = state
                    {
                        *uploading = false;
                        *upload_outcome = Some(UploadOutcome::Failure);
                    }
                });
            }
            ConfirmOutcome::Persisted(server_record) => {
                let shipment_id = server_record.id;
                self.transition(ScanState::ShowResult {
                    record: server_record.clone(),
                    pending_photo: None,
                    uploading: false,
                    upload_outcome: Some(UploadOutcome::Success),
                });
                if self
                    .signal_tx
                    .send(WorkflowSignal::ReadyToAdvance { shipment_id })
                    .is_err()
                {
                    debug!("no signal receiver");
                }
            }
            ConfirmOutcome::PersistFailed { local_record, .. } => {
                self.transition(ScanState::ShowResult {
                    record: local_record.clone(),
                    pending_photo: Some(photo),
                    uploading: false,
                    upload_outcome: Some(UploadOutcome::Failure),
                });
            }
        }

        Ok(outcome)
    }

    pub fn go_idle(&mut self) {
        if self.ignore_if_closed("go_idle") {
            return;
        }
        self.last_code = None;
        self.transition(ScanState::Idle);
    }

    /// 進行中の通信を中断し、デコーダを解放する（以降のイベントは無視）
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel_token.cancel();
        if let Some(scanner) = &self.scanner {
            scanner.release();
        }
        info!("workflow closed");
    }

    fn enter_scanning(&mut self) {
        if let Some(scanner) = &self.scanner {
            scanner.reset();
        }
        self.transition(ScanState::Scanning);
    }

    fn set_pending_photo(&mut self, photo: Option<PathBuf>) {
        if self.ignore_if_closed("photo") {
            return;
        }
        let applied = self.state_tx.send_if_modified(|state| match state {
            ScanState::ShowResult {
                pending_photo,
                uploading,
                upload_outcome,
                ..
            } => {
                *pending_photo = photo;
                *uploading = false;
                *upload_outcome = None;
                true
            }
            _ => false,
        });
        if !applied {
            debug!("photo change while {}; ignored", self.state());
        }
    }

    fn transition(&self, next: ScanState) {
        let previous = self.state_tx.send_replace(next);
        debug!("state {} -> {}", previous, self.state_tx.borrow().name());
    }

    fn ignore_if_closed(&self, event: &str) -> bool {
        let closed = self.is_closed();
        if closed {
            debug!("{} after close; ignored", event);
        }
        closed
    }

    async fn cancellable<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(FastPackError::Cancelled),
            result = call => result,
        }
    }

    async fn guarded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.options.call_timeout;
        self.cancellable(async move {
            tokio::time::timeout(timeout, call)
                .await
                .unwrap_or(Err(FastPackError::Timeout))
        })
        .await
    }
}
