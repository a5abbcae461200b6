//! スキャンワークフローの状態

use fastpack_common::{ShipmentId, ShipmentRecord};
use std::fmt;
use std::path::PathBuf;

/// 直近のアップロード結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    RequestingPermission,
    Scanning,
    Loading,
    ShowResult {
        record: ShipmentRecord,
        pending_photo: Option<PathBuf>,
        uploading: bool,
        upload_outcome: Option<UploadOutcome>,
    },
    NoResult {
        scanned_code: String,
    },
    Error {
        message: String,
    },
}

impl ScanState {
    /// 取得直後の結果表示状態
    pub fn show_result(record: ShipmentRecord) -> Self {
        ScanState::ShowResult {
            record,
            pending_photo: None,
            uploading: false,
            upload_outcome: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::RequestingPermission => "requesting_permission",
            ScanState::Scanning => "scanning",
            ScanState::Loading => "loading",
            ScanState::ShowResult { .. } => "show_result",
            ScanState::NoResult { .. } => "no_result",
            ScanState::Error { .. } => "error",
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, ScanState::Scanning)
    }

    /// 表示中のレコード
    pub fn record(&self) -> Option<&ShipmentRecord> {
        match self {
            ScanState::ShowResult { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn pending_photo(&self) -> Option<&PathBuf> {
        match self {
            ScanState::ShowResult { pending_photo, .. } => pending_photo.as_ref(),
            _ => None,
        }
    }

    pub fn upload_outcome(&self) -> Option<UploadOutcome> {
        match self {
            ScanState::ShowResult { upload_outcome, .. } => *upload_outcome,
            _ => None,
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::ShowResult { record, .. } => write!(f, "show_result({})", record.id),
            ScanState::NoResult { scanned_code } => write!(f, "no_result({})", scanned_code),
            ScanState::Error { message } => write!(f, "error({})", message),
            other => f.write_str(other.name()),
        }
    }
}

/// UIへの一方向通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowSignal {
    /// 写真の保存が完了し、次の出荷へ進める
    ReadyToAdvance { shipment_id: ShipmentId },
}
