//! 端末表示
//!
//! 表示文字列の組み立てと出力を分け、組み立て側をテストする。

use crate::cli::OutputFormat;
use crate::error::Result;
use chrono::{DateTime, Local};
use fastpack_common::{AnalysisCounters, BucketCounts, LogisticsClass, ShipmentRecord};
use serde::Serialize;

const NONE: &str = "-";

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NONE)
}

fn logistics_label(record: &ShipmentRecord) -> String {
    match record.logistics_class() {
        LogisticsClass::SelfManaged => "自社集荷".to_string(),
        LogisticsClass::Dispatch(Some(kind)) => format!("配送({})", kind),
        LogisticsClass::Dispatch(None) => "配送".to_string(),
    }
}

fn bucket_line(label: &str, counts: &BucketCounts) -> String {
    format!(
        "  {:<6} 計 {:>4} | 印刷待ち {:>4} | 梱包済み {:>4} | 保留 {:>4}",
        label,
        counts.total(),
        counts.ready_to_print,
        counts.ready_to_prepare,
        counts.pending
    )
}

pub fn summary_lines(counters: &AnalysisCounters, fetched_at: DateTime<Local>) -> Vec<String> {
    vec![
        format!("梱包待ち出荷: {}件", counters.total),
        bucket_line("自社集荷", &counters.self_managed),
        bucket_line("配送", &counters.dispatch),
        format!("取得日時: {}", fetched_at.format("%Y-%m-%d %H:%M:%S")),
    ]
}

/// 一覧の1行
pub fn shipment_line(record: &ShipmentRecord) -> String {
    format!(
        "{}  {:<14} {:<16} {:<14} {}{}",
        record.id,
        or_dash(record.status.as_deref()),
        or_dash(record.substatus.as_deref()),
        or_dash(record.buyer_nickname.as_deref()),
        logistics_label(record),
        if record.has_photo() { "  📷" } else { "" }
    )
}

pub fn shipment_detail_lines(record: &ShipmentRecord) -> Vec<String> {
    let mut lines = vec![
        format!("出荷ID:     {}", record.id),
        format!("注文ID:     {}", or_dash(record.order_id.as_deref())),
        format!("購入者:     {}", or_dash(record.buyer_nickname.as_deref())),
        format!("追跡番号:   {}", or_dash(record.tracking_number.as_deref())),
        format!("物流区分:   {}", logistics_label(record)),
        format!(
            "ステータス: {} / {}",
            or_dash(record.status.as_deref()),
            or_dash(record.substatus.as_deref())
        ),
    ];

    let items = record.items();
    if items.is_empty() {
        lines.push("商品:       なし".to_string());
    } else {
        lines.push(format!("商品:       {}点", items.len()));
        for item in items {
            let variation = item
                .variation_name
                .as_deref()
                .map(|v| format!(" [{}]", v))
                .unwrap_or_default();
            lines.push(format!(
                "  - {} x{}{}",
                or_dash(item.description.as_deref()),
                item.quantity.unwrap_or(1),
                variation
            ));
        }
    }

    if let Some(comment) = record.packing_comment.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("梱包メモ:   {}", comment));
    }

    match &record.shipped_items_photo {
        Some(photo) if !photo.url.is_empty() => lines.push(format!("梱包写真:   {}", photo.url)),
        _ => lines.push("梱包写真:   未登録".to_string()),
    }

    lines
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_summary(counters: &AnalysisCounters, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&counters.to_key_map()),
        OutputFormat::Table => {
            for line in summary_lines(counters, Local::now()) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

pub fn print_shipments(records: &[ShipmentRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("該当する出荷はありません");
                return Ok(());
            }
            for record in records {
                println!("{}", shipment_line(record));
            }
            println!("---\n{}件", records.len());
            Ok(())
        }
    }
}

pub fn print_shipment(record: &ShipmentRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            for line in shipment_detail_lines(record) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}
