//! 梱包ワークフロー
//!
//! - state: 画面状態と通知
//! - coordinator: 写真アップロードと出荷更新の順序制御
//! - controller: スキャンから保存までの状態機械

mod controller;
mod coordinator;
mod state;

pub use controller::{CancelHandle, ScanWorkflowController, WorkflowOptions};
pub use coordinator::{ConfirmOutcome, PhotoUploadCoordinator};
pub use state::{ScanState, UploadOutcome, WorkflowSignal};
