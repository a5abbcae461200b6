//! デコード排他制御
//!
//! - DecodeSlot: 同時に1フレームだけ認識処理に入れる（CASで取得、負けたフレームは破棄）
//! - SessionLatch: セッション内で1回だけ成功を報告する

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const BUSY: u64 = 1;

/// 認識処理中フラグ
///
/// 最下位ビットが使用中、残りが世代。`clear()` で世代が進み、
/// それ以前の許可は drop しても新しい占有者を解放しない。
#[derive(Debug, Default)]
pub struct DecodeSlot {
    state: AtomicU64,
}

/// スロット占有中の許可（drop で解放）
#[derive(Debug)]
pub struct SlotPermit<'a> {
    slot: &'a DecodeSlot,
    held: u64,
}

impl DecodeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空いていれば占有する。使用中なら None
    pub fn try_acquire(&self) -> Option<SlotPermit<'_>> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & BUSY != 0 {
                return None;
            }
            match self.state.compare_exchange(
                current,
                current | BUSY,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(SlotPermit {
                        slot: self,
                        held: current | BUSY,
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.load(Ordering::Acquire) & BUSY != 0
    }

    /// 強制解放（リセット用）。処理中の許可は古い世代になる
    pub fn clear(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                Some((s | BUSY).wrapping_add(1))
            });
    }
}

impl SlotPermit<'_> {
    /// 取得後に `clear()` されていなければ true
    pub fn is_current(&self) -> bool {
        self.slot.state.load(Ordering::Acquire) == self.held
    }
}

impl Drop for SlotPermit<'_> {
    fn drop(&mut self) {
        // 世代が変わっていれば何もしない
        let _ = self.slot.state.compare_exchange(
            self.held,
            self.held & !BUSY,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// スキャン済みフラグ
#[derive(Debug, Default)]
pub struct SessionLatch {
    scanned: AtomicBool,
}

impl SessionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未スキャンならスキャン済みにして true
    pub fn try_latch(&self) -> bool {
        self.scanned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_latched(&self) -> bool {
        self.scanned.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.scanned.store(false, Ordering::Release);
    }
}
