//! 出荷集計ロジック
//!
//! 梱包待ち出荷を物流区分（自社集荷/配送）× 準備状態で分類し、
//! ホーム画面用のカウンタを生成する。

use crate::types::{ShipmentRecord, READY_TO_PRINT, SELF_SERVICE};
use serde::Serialize;
use std::collections::BTreeMap;

/// 集計キー（ホーム画面の表示キー）
pub mod keys {
    pub const TOTAL: &str = "TotalEnvios";
    pub const FLEX_READY_TO_PRINT: &str = "FlexReadyToPrint";
    pub const FLEX_READY_TO_PREPARE: &str = "FlexReadyToPrepare";
    pub const FLEX_PENDING: &str = "FlexPendientes";
    pub const DESP_READY_TO_PRINT: &str = "DespReadyToPrint";
    pub const DESP_READY_TO_PREPARE: &str = "DespReadyToPrepare";
    pub const DESP_PENDING: &str = "DespPendientes";
}

/// 分類ルール
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    /// 自社集荷として扱う logistic_type
    pub self_managed_types: Vec<String>,
    /// 印刷待ちとみなす substatus
    pub ready_substatus: String,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            self_managed_types: vec![SELF_SERVICE.to_string()],
            ready_substatus: READY_TO_PRINT.to_string(),
        }
    }
}

/// 物流区分バケット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    SelfManaged,
    Dispatch,
}

/// 準備状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// 印刷待ち（写真なし）
    ReadyToPrint,
    /// 印刷待ちかつ梱包写真あり
    ReadyToPrepare,
    /// それ以外
    Pending,
}

impl ClassificationRules {
    /// 1件の出荷を分類
    pub fn classify(&self, shipment: &ShipmentRecord) -> (Bucket, Readiness) {
        let bucket = match shipment.logistic_type.as_deref() {
            Some(t) if self.self_managed_types.iter().any(|s| s == t) => Bucket::SelfManaged,
            _ => Bucket::Dispatch,
        };

        let readiness = if shipment.substatus.as_deref() == Some(self.ready_substatus.as_str()) {
            if shipment.has_photo() {
                Readiness::ReadyToPrepare
            } else {
                Readiness::ReadyToPrint
            }
        } else {
            Readiness::Pending
        };

        (bucket, readiness)
    }
}

/// バケットごとの件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub ready_to_print: usize,
    pub ready_to_prepare: usize,
    pub pending: usize,
}

impl BucketCounts {
    pub fn total(&self) -> usize {
        self.ready_to_print + self.ready_to_prepare + self.pending
    }

    fn add(&mut self, readiness: Readiness) {
        match readiness {
            Readiness::ReadyToPrint => self.ready_to_print += 1,
            Readiness::ReadyToPrepare => self.ready_to_prepare += 1,
            Readiness::Pending => self.pending += 1,
        }
    }
}

/// 集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCounters {
    pub total: usize,
    pub self_managed: BucketCounts,
    pub dispatch: BucketCounts,
}

impl AnalysisCounters {
    /// ホーム画面用のフラットなキーマップ
    pub fn to_key_map(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            (keys::TOTAL, self.total),
            (keys::FLEX_READY_TO_PRINT, self.self_managed.ready_to_print),
            (keys::FLEX_READY_TO_PREPARE, self.self_managed.ready_to_prepare),
            (keys::FLEX_PENDING, self.self_managed.pending),
            (keys::DESP_READY_TO_PRINT, self.dispatch.ready_to_print),
            (keys::DESP_READY_TO_PREPARE, self.dispatch.ready_to_prepare),
            (keys::DESP_PENDING, self.dispatch.pending),
        ])
    }
}

/// 既定ルールで集計
pub fn analyze(shipments: &[ShipmentRecord]) -> AnalysisCounters {
    analyze_with(shipments, &ClassificationRules::default())
}

/// 指定ルールで集計
pub fn analyze_with(shipments: &[ShipmentRecord], rules: &ClassificationRules) -> AnalysisCounters {
    let mut counters = AnalysisCounters {
        total: shipments.len(),
        ..Default::default()
    };

    for shipment in shipments {
        let (bucket, readiness) = rules.classify(shipment);
        match bucket {
            Bucket::SelfManaged => counters.self_managed.add(readiness),
            Bucket::Dispatch => counters.dispatch.add(readiness),
        }
    }

    counters
}
