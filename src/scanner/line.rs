//! キーボードウェッジ型スキャナ用の認識器
//!
//! ハンディスキャナは1シンボルを1行として入力する。
//! `qr:` / `code128:` などの接頭辞があればシンボル体系を決め、
//! なければ `{` 始まりをQR、それ以外をリニアとみなす。

use super::SymbolRecognizer;
use crate::error::Result;
use fastpack_common::{RawSymbol, Symbology};

const LINEAR_PREFIXES: &[&str] = &[
    "code128", "code39", "code93", "codabar", "ean13", "ean8", "itf", "upc_a", "upc_e",
];
const QR_PREFIXES: &[&str] = &["qr"];
const OTHER_PREFIXES: &[&str] = &["aztec", "datamatrix", "pdf417"];

/// 1行をシンボルに変換（空行は None）
pub fn parse_line(line: &str) -> Option<RawSymbol> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some((prefix, rest)) = line.split_once(':') {
        let prefix = prefix.trim().to_ascii_lowercase();
        let symbology = if LINEAR_PREFIXES.contains(&prefix.as_str()) {
            Some(Symbology::Linear)
        } else if QR_PREFIXES.contains(&prefix.as_str()) {
            Some(Symbology::Qr)
        } else if OTHER_PREFIXES.contains(&prefix.as_str()) {
            Some(Symbology::Other)
        } else {
            None
        };

        if let Some(symbology) = symbology {
            let rest = rest.trim();
            if rest.is_empty() {
                return None;
            }
            return Some(RawSymbol::new(rest, symbology));
        }
    }

    let symbology = if line.starts_with('{') {
        Symbology::Qr
    } else {
        Symbology::Linear
    };
    Some(RawSymbol::new(line, symbology))
}

/// 標準入力の行をフレームとして扱う認識器
#[derive(Debug, Default, Clone, Copy)]
pub struct LineRecognizer;

impl SymbolRecognizer for LineRecognizer {
    type Frame = String;

    fn recognize(&self, frame: &String) -> Result<Vec<RawSymbol>> {
        Ok(parse_line(frame).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprefixed_linear() {
        let symbol = parse_line("02034578901\n").unwrap();
        assert_eq!(symbol.symbology, Symbology::Linear);
        assert_eq!(symbol.raw_value.as_deref(), Some("02034578901"));
    }

    #[test]
    fn test_unprefixed_json_is_qr() {
        let symbol = parse_line(r#"{"id":"02034578901","sender_id":1}"#).unwrap();
        assert_eq!(symbol.symbology, Symbology::Qr);
    }

    #[test]
    fn test_prefixes() {
        let symbol = parse_line("qr:{\"id\":\"02034578901\"}").unwrap();
        assert_eq!(symbol.symbology, Symbology::Qr);
        assert_eq!(symbol.raw_value.as_deref(), Some("{\"id\":\"02034578901\"}"));

        let symbol = parse_line("CODE128: 02034578901").unwrap();
        assert_eq!(symbol.symbology, Symbology::Linear);
        assert_eq!(symbol.raw_value.as_deref(), Some("02034578901"));

        let symbol = parse_line("ean13:4901234567894").unwrap();
        assert_eq!(symbol.symbology, Symbology::Linear);

        let symbol = parse_line("pdf417:02034578901").unwrap();
        assert_eq!(symbol.symbology, Symbology::Other);
    }

    #[test]
    fn test_unknown_prefix_kept_as_text() {
        let symbol = parse_line("https://example.com/a").unwrap();
        assert_eq!(symbol.symbology, Symbology::Linear);
        assert_eq!(symbol.raw_value.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_blank_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \r\n").is_none());
        assert!(parse_line("qr:  ").is_none());

        let recognizer = LineRecognizer;
        assert!(recognizer.recognize(&"\n".to_string()).unwrap().is_empty());
        assert_eq!(recognizer.recognize(&"12345678901".to_string()).unwrap().len(), 1);
    }
}
