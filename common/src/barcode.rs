//! バーコード値の抽出と検証（デコーダ/ワークフロー共通）
//!
//! 認識器が返した生テキストをシンボル体系ごとに解釈し、
//! 出荷IDとして妥当な値（11桁の数字）だけを残す。

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 出荷IDの桁数
pub const CODE_LENGTH: usize = 11;

/// シンボル体系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// 一次元コード（CODE_128 など）
    Linear,
    /// QRコード（JSONペイロード）
    Qr,
    /// 未対応の体系
    Other,
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbology::Linear => write!(f, "linear"),
            Symbology::Qr => write!(f, "qr"),
            Symbology::Other => write!(f, "other"),
        }
    }
}

/// 認識器が1フレームから検出したシンボル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub raw_value: Option<String>,
    pub symbology: Symbology,
}

impl RawSymbol {
    pub fn new(raw_value: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            raw_value: Some(raw_value.into()),
            symbology,
        }
    }
}

/// 検証済みのデコード結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCode {
    pub value: String,
    pub symbology: Symbology,
}

/// QRコードのJSONペイロード
///
/// `id` 以外は任意。未知のキーは無視する。
#[derive(Debug, Clone, Deserialize)]
pub struct QrPayload {
    pub id: QrId,
    #[serde(default)]
    pub sender_id: Option<u64>,
    #[serde(default)]
    pub hash_code: Option<String>,
    #[serde(default)]
    pub security_digit: Option<String>,
}

/// QRペイロードの `id`（文字列または整数）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QrId {
    Text(String),
    Number(u64),
}

impl QrId {
    pub fn into_string(self) -> String {
        match self {
            QrId::Text(s) => s,
            QrId::Number(n) => n.to_string(),
        }
    }
}

/// QRコードの生テキストをパース
pub fn parse_qr_payload(raw: &str) -> Result<QrPayload> {
    Ok(serde_json::from_str(raw)?)
}

/// シンボル体系に応じて値を抽出
///
/// - Linear: 生テキストをそのまま使用
/// - Qr: JSONの `id` フィールド（パース失敗時は None）
/// - Other: 抽出しない
pub fn extract_value(raw: &str, symbology: Symbology) -> Option<String> {
    match symbology {
        Symbology::Linear => Some(raw.to_string()),
        Symbology::Qr => parse_qr_payload(raw).ok().map(|p| p.id.into_string()),
        Symbology::Other => None,
    }
}

/// 出荷IDとして妥当か（ちょうど11文字、すべてASCII数字）
///
/// # Examples
/// ```
/// use fastpack_common::is_valid_code;
///
/// assert!(is_valid_code("12345678901"));
/// assert!(!is_valid_code("1234567890"));
/// assert!(!is_valid_code("1234567890a"));
/// ```
pub fn is_valid_code(value: &str) -> bool {
    value.len() == CODE_LENGTH && value.bytes().all(|b| b.is_ascii_digit())
}

/// バッチ内で最初に妥当な値を持つシンボルを返す
pub fn first_valid_code(symbols: &[RawSymbol]) -> Option<DecodedCode> {
    symbols.iter().find_map(|symbol| {
        let raw = symbol.raw_value.as_deref()?;
        let value = extract_value(raw, symbol.symbology)?;
        is_valid_code(&value).then(|| DecodedCode {
            value,
            symbology: symbol.symbology,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_linear_uses_raw_text() {
        assert_eq!(
            extract_value("02034578901", Symbology::Linear),
            Some("02034578901".to_string())
        );
        // 検証前なので不正値もそのまま
        assert_eq!(extract_value("ABC", Symbology::Linear), Some("ABC".to_string()));
    }

    #[test]
    fn test_extract_qr_id_field() {
        let raw = r#"{"id":"41234567890","sender_id":123456,"hash_code":"xyz","security_digit":"0"}"#;
        assert_eq!(extract_value(raw, Symbology::Qr), Some("41234567890".to_string()));
    }

    #[test]
    fn test_extract_qr_ignores_unknown_keys() {
        let raw = r#"{"id":"41234567890","extra":{"nested":true}}"#;
        assert_eq!(extract_value(raw, Symbology::Qr), Some("41234567890".to_string()));
    }

    #[test]
    fn test_extract_qr_numeric_id() {
        let raw = r#"{"id":41234567890}"#;
        assert_eq!(extract_value(raw, Symbology::Qr), Some("41234567890".to_string()));
    }

    #[test]
    fn test_extract_qr_invalid_json() {
        assert_eq!(extract_value("not json", Symbology::Qr), None);
        assert_eq!(extract_value("{\"sender_id\": 1}", Symbology::Qr), None);
        assert_eq!(extract_value("41234567890", Symbology::Qr), None);
    }

    #[test]
    fn test_extract_other_symbology() {
        assert_eq!(extract_value("41234567890", Symbology::Other), None);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("12345678901"));
        assert!(is_valid_code("00000000000"));
        assert!(!is_valid_code("1234567890"));
        assert!(!is_valid_code("123456789012"));
        assert!(!is_valid_code("1234567890a"));
        assert!(!is_valid_code(" 2345678901"));
        assert!(!is_valid_code(""));
        // 全角数字は対象外
        assert!(!is_valid_code("１２３４５６７８９０１"));
    }

    #[test]
    fn test_first_valid_code_skips_invalid() {
        let symbols = vec![
            RawSymbol::new("1234", Symbology::Linear),
            RawSymbol { raw_value: None, symbology: Symbology::Linear },
            RawSymbol::new("99999999999", Symbology::Other),
            RawSymbol::new(r#"{"id":"41234567890"}"#, Symbology::Qr),
            RawSymbol::new("02034578901", Symbology::Linear),
        ];

        let code = first_valid_code(&symbols).unwrap();
        assert_eq!(code.value, "41234567890");
        assert_eq!(code.symbology, Symbology::Qr);
    }

    #[test]
    fn test_first_valid_code_none() {
        let symbols = vec![RawSymbol::new("abc", Symbology::Linear)];
        assert!(first_valid_code(&symbols).is_none());
        assert!(first_valid_code(&[]).is_none());
    }

    #[test]
    fn test_qr_payload_optional_fields() {
        let payload = parse_qr_payload(r#"{"id":"41234567890","sender_id":77}"#).unwrap();
        assert_eq!(payload.sender_id, Some(77));
        assert!(payload.hash_code.is_none());
        assert!(payload.security_digit.is_none());
    }
}
