//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use fastpack::config::Config;
use fastpack::error::FastPackError;
use fastpack::photo;
use fastpack_common::ShipmentId;
use std::path::Path;
use tempfile::tempdir;

/// 存在しない撮影フォルダ
#[test]
fn test_latest_photo_nonexistent_folder() {
    let result = photo::latest_photo(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(FastPackError::FileNotFound(_))));
}

/// 画像のないフォルダは空扱い
#[test]
fn test_latest_photo_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = photo::latest_photo(dir.path());
    assert!(result.unwrap().is_none());
}

/// 画像以外のファイルはアップロード対象外
#[test]
fn test_validate_photo_rejects_non_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("label.pdf");
    std::fs::write(&path, "pdf").unwrap();

    let err = photo::validate_photo(&path).unwrap_err();
    assert!(matches!(err, FastPackError::InvalidPhoto(_)));
    assert!(err.to_string().contains("label.pdf"));
}

/// cloud名が無ければアップロード先を組み立てられない
#[test]
fn test_upload_endpoint_requires_cloud_name() {
    let config = Config::default();
    let err = config.upload_endpoint().unwrap_err();
    assert!(matches!(err, FastPackError::Config(_)));
    assert!(err.to_string().contains("fastpack config --cloud-name"));
}

/// FastPackErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        FastPackError::Config("テスト設定エラー".to_string()),
        FastPackError::Auth("認証失敗".to_string()),
        FastPackError::Api { status: 500, message: "boom".to_string() },
        FastPackError::Timeout,
        FastPackError::Cancelled,
        FastPackError::Upload("アップロード失敗".to_string()),
        FastPackError::Recognition("認識失敗".to_string()),
        FastPackError::InvalidIdentifier("1234".to_string()),
        FastPackError::InvalidPhoto("a.txt".to_string()),
        FastPackError::FileNotFound("box.jpg".to_string()),
        FastPackError::Prompt("入力中断".to_string()),
        FastPackError::InvalidState("idle".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// APIエラーはステータスとメッセージを含む
#[test]
fn test_api_error_message() {
    let err = FastPackError::Api { status: 503, message: "Service Unavailable".to_string() };
    let display = err.to_string();
    assert!(display.contains("503"));
    assert!(display.contains("Service Unavailable"));
}

/// NotLoggedInエラーのメッセージ確認
#[test]
fn test_not_logged_in_message() {
    let display = format!("{}", FastPackError::NotLoggedIn);
    assert!(display.contains("ログイン"));
    assert!(display.contains("fastpack login"));
}

/// エラーのDebug実装確認
#[test]
fn test_error_debug() {
    let err = FastPackError::Config("テスト".to_string());
    let debug = format!("{:?}", err);

    assert!(debug.contains("Config"));
    assert!(debug.contains("テスト"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: FastPackError = io_err.into();

    assert!(matches!(err, FastPackError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: FastPackError = json_err.into();

    assert!(matches!(err, FastPackError::JsonParse(_)));
}

/// common::Errorからの変換（メッセージはそのまま表示）
#[test]
fn test_common_error_conversion() {
    let common_err = ShipmentId::parse("1234").unwrap_err();
    let err: FastPackError = common_err.into();

    assert!(matches!(err, FastPackError::Common(_)));
    assert!(err.to_string().contains("1234"));
}
