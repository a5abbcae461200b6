//! バーコードデコーダ
//!
//! フレームを認識器に渡し、シンボル体系ごとの抽出と11桁検証を行う。
//! 1セッションで報告する成功は1回だけ（`reset()` まで）。

use super::guard::{DecodeSlot, SessionLatch};
use super::{ScannerControl, SymbolRecognizer};
use fastpack_common::barcode::{extract_value, is_valid_code};
use fastpack_common::DecodedCode;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

type DecodedCallback = Box<dyn Fn(&DecodedCode) + Send + Sync>;

pub struct BarcodeDecoder<R: SymbolRecognizer> {
    recognizer: R,
    slot: DecodeSlot,
    latch: SessionLatch,
    released: AtomicBool,
    on_decoded: Option<DecodedCallback>,
}

impl<R: SymbolRecognizer> BarcodeDecoder<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            slot: DecodeSlot::new(),
            latch: SessionLatch::new(),
            released: AtomicBool::new(false),
            on_decoded: None,
        }
    }

    /// 成功時のコールバックを設定
    pub fn on_decoded(mut self, callback: impl Fn(&DecodedCode) + Send + Sync + 'static) -> Self {
        self.on_decoded = Some(Box::new(callback));
        self
    }

    /// 1フレームを処理
    ///
    /// 処理中・スキャン済み・解放済みのときはフレームを破棄して None。
    pub fn submit_frame(&self, frame: R::Frame) -> Option<DecodedCode> {
        if self.released.load(Ordering::Acquire) || self.latch.is_latched() {
            return None;
        }

        let Some(permit) = self.slot.try_acquire() else {
            debug!("decode in progress; frame dropped");
            return None;
        };

        // 取得待ちの間に他フレームが成功している場合
        if self.latch.is_latched() {
            return None;
        }

        let symbols = match self.recognizer.recognize(&frame) {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!("バーコード認識に失敗: {}", e);
                return None;
            }
        };
        drop(frame);

        // 認識中に reset された結果は前のセッションのもの
        if !permit.is_current() {
            debug!("decoder reset during recognition; result discarded");
            return None;
        }

        for symbol in &symbols {
            let Some(raw) = symbol.raw_value.as_deref() else {
                continue;
            };

            match extract_value(raw, symbol.symbology) {
                Some(value) if is_valid_code(&value) => {
                    if !self.latch.try_latch() {
                        return None;
                    }
                    info!("valid code {} ({})", value, symbol.symbology);
                    let code = DecodedCode {
                        value,
                        symbology: symbol.symbology,
                    };
                    if let Some(callback) = &self.on_decoded {
                        callback(&code);
                    }
                    return Some(code);
                }
                extracted => {
                    debug!(
                        "ignored symbol: raw={:?} extracted={:?} format={}",
                        raw, extracted, symbol.symbology
                    );
                }
            }
        }

        None
    }

    pub fn has_scanned(&self) -> bool {
        self.latch.is_latched()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }
}

impl<R: SymbolRecognizer> ScannerControl for BarcodeDecoder<R> {
    fn reset(&self) {
        self.latch.clear();
        self.slot.clear();
        debug!("decoder reset for new scan");
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("releasing recognizer");
        self.recognizer.close();
    }
}
