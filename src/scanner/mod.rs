//! バーコード読み取り
//!
//! 認識器（カメラ/ハンディスキャナ）はトレイトで差し替え可能。
//! デコーダは妥当な出荷IDを1セッションにつき1回だけ報告する。

mod decoder;
mod guard;
mod line;

pub use decoder::BarcodeDecoder;
pub use guard::{DecodeSlot, SessionLatch, SlotPermit};
pub use line::{parse_line, LineRecognizer};

use crate::error::Result;
use fastpack_common::RawSymbol;

/// シンボル認識器
pub trait SymbolRecognizer: Send + Sync {
    type Frame: Send;

    /// 1フレームから候補シンボルを検出
    fn recognize(&self, frame: &Self::Frame) -> Result<Vec<RawSymbol>>;

    /// 認識器の解放
    fn close(&self) {}
}

/// ワークフローからデコーダを操作するためのハンドル
pub trait ScannerControl: Send + Sync {
    /// 新しいスキャンセッションを開始
    fn reset(&self);

    /// 認識器を解放（2回目以降は何もしない）
    fn release(&self);
}
