//! デコーダの排他制御テスト
//!
//! 複数スレッドからフレームを投入して、処理中の破棄と1回だけの報告を検証

use fastpack::error::Result;
use fastpack::scanner::{BarcodeDecoder, LineRecognizer, ScannerControl, SymbolRecognizer};
use fastpack_common::{RawSymbol, Symbology};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

/// 認識中に止められるフレーム
struct Frame {
    value: String,
    gate: Option<(Arc<Barrier>, Arc<Barrier>)>,
}

impl Frame {
    fn plain(value: &str) -> Self {
        Self {
            value: value.to_string(),
            gate: None,
        }
    }

    fn gated(value: &str, entered: Arc<Barrier>, proceed: Arc<Barrier>) -> Self {
        Self {
            value: value.to_string(),
            gate: Some((entered, proceed)),
        }
    }
}

#[derive(Default)]
struct GatedRecognizer {
    calls: AtomicUsize,
    closes: AtomicUsize,
}

impl SymbolRecognizer for GatedRecognizer {
    type Frame = Frame;

    fn recognize(&self, frame: &Frame) -> Result<Vec<RawSymbol>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, proceed)) = &frame.gate {
            entered.wait();
            proceed.wait();
        }
        Ok(vec![RawSymbol::new(frame.value.clone(), Symbology::Linear)])
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_frame_dropped_while_in_flight() {
    let decoder = Arc::new(BarcodeDecoder::new(GatedRecognizer::default()));
    let entered = Arc::new(Barrier::new(2));
    let proceed = Arc::new(Barrier::new(2));

    let worker = {
        let decoder = Arc::clone(&decoder);
        let frame = Frame::gated("02034578901", entered.clone(), proceed.clone());
        thread::spawn(move || decoder.submit_frame(frame))
    };

    // ワーカーが認識処理中
    entered.wait();
    assert!(decoder.submit_frame(Frame::plain("11111111111")).is_none());
    assert_eq!(decoder.recognizer().calls.load(Ordering::SeqCst), 1);

    proceed.wait();
    let code = worker.join().unwrap().unwrap();
    assert_eq!(code.value, "02034578901");

    // スキャン済み
    assert!(decoder.submit_frame(Frame::plain("11111111111")).is_none());
    assert_eq!(decoder.recognizer().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invalid_frame_frees_slot() {
    let decoder = Arc::new(BarcodeDecoder::new(GatedRecognizer::default()));
    let entered = Arc::new(Barrier::new(2));
    let proceed = Arc::new(Barrier::new(2));

    let worker = {
        let decoder = Arc::clone(&decoder);
        let frame = Frame::gated("not-an-id", entered.clone(), proceed.clone());
        thread::spawn(move || decoder.submit_frame(frame))
    };
    entered.wait();
    proceed.wait();
    assert!(worker.join().unwrap().is_none());

    let code = decoder.submit_frame(Frame::plain("11111111111")).unwrap();
    assert_eq!(code.value, "11111111111");
}

#[test]
fn test_single_report_across_threads() {
    let reports = Arc::new(AtomicUsize::new(0));
    let callback_hits = Arc::clone(&reports);
    let decoder = BarcodeDecoder::new(GatedRecognizer::default()).on_decoded(move |_| {
        callback_hits.fetch_add(1, Ordering::SeqCst);
    });
    let start = Barrier::new(8);
    let returned = AtomicUsize::new(0);

    thread::scope(|s| {
        for t in 0..8 {
            let decoder = &decoder;
            let start = &start;
            let returned = &returned;
            s.spawn(move || {
                start.wait();
                for i in 0..50 {
                    let value = format!("{:011}", t * 1000 + i);
                    if decoder.submit_frame(Frame::plain(&value)).is_some() {
                        returned.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(returned.load(Ordering::SeqCst), 1);
    assert_eq!(reports.load(Ordering::SeqCst), 1);
    assert!(decoder.has_scanned());
}

#[test]
fn test_reset_starts_new_session() {
    let decoder = BarcodeDecoder::new(GatedRecognizer::default());
    assert!(decoder.submit_frame(Frame::plain("02034578901")).is_some());
    assert!(decoder.submit_frame(Frame::plain("02034578902")).is_none());

    decoder.reset();
    assert!(!decoder.has_scanned());
    let code = decoder.submit_frame(Frame::plain("02034578902")).unwrap();
    assert_eq!(code.value, "02034578902");
}

#[test]
fn test_stale_frame_after_reset_keeps_slot_held() {
    let decoder = Arc::new(BarcodeDecoder::new(GatedRecognizer::default()));
    let (entered_a, proceed_a) = (Arc::new(Barrier::new(2)), Arc::new(Barrier::new(2)));
    let (entered_b, proceed_b) = (Arc::new(Barrier::new(2)), Arc::new(Barrier::new(2)));

    let frame_a = {
        let decoder = Arc::clone(&decoder);
        let frame = Frame::gated("02034578901", entered_a.clone(), proceed_a.clone());
        thread::spawn(move || decoder.submit_frame(frame))
    };
    entered_a.wait();

    // A の認識中に新しいスキャンを開始
    decoder.reset();

    let frame_b = {
        let decoder = Arc::clone(&decoder);
        let frame = Frame::gated("02034578902", entered_b.clone(), proceed_b.clone());
        thread::spawn(move || decoder.submit_frame(frame))
    };
    entered_b.wait();

    // A の完了では B の占有は解けず、結果も報告されない
    proceed_a.wait();
    assert!(frame_a.join().unwrap().is_none());
    assert!(!decoder.has_scanned());

    assert!(decoder.submit_frame(Frame::plain("11111111111")).is_none());
    assert_eq!(decoder.recognizer().calls.load(Ordering::SeqCst), 2);

    proceed_b.wait();
    let code = frame_b.join().unwrap().unwrap();
    assert_eq!(code.value, "02034578902");
    assert!(decoder.has_scanned());
}

#[test]
fn test_concurrent_release_closes_once() {
    let decoder = BarcodeDecoder::new(GatedRecognizer::default());

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| decoder.release());
        }
    });

    assert_eq!(decoder.recognizer().closes.load(Ordering::SeqCst), 1);
    assert!(decoder.submit_frame(Frame::plain("02034578901")).is_none());
    assert_eq!(decoder.recognizer().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_line_scanner_formats() {
    let decoder = BarcodeDecoder::new(LineRecognizer);
    let code = decoder
        .submit_frame(r#"qr:{"id":"02034578901","sender_id":123,"hash_code":"x"}"#.to_string())
        .unwrap();
    assert_eq!(code.value, "02034578901");
    assert_eq!(code.symbology, Symbology::Qr);

    decoder.reset();
    let code = decoder.submit_frame(r#"{"id":20345678901}"#.to_string()).unwrap();
    assert_eq!(code.value, "20345678901");

    decoder.reset();
    assert!(decoder.submit_frame("pdf417:02034578901".to_string()).is_none());
    assert!(decoder.submit_frame("qr:not json".to_string()).is_none());
    assert!(decoder.submit_frame(String::new()).is_none());
    let code = decoder.submit_frame("code128:02034578901".to_string()).unwrap();
    assert_eq!(code.symbology, Symbology::Linear);
}
