use thiserror::Error;

#[derive(Error, Debug)]
pub enum FastPackError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログインしていません。`fastpack login --email YOUR_EMAIL` でログインしてください")]
    NotLoggedIn,

    #[error("認証エラー: {0}")]
    Auth(String),

    #[error("APIエラー [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("通信がタイムアウトしました")]
    Timeout,

    #[error("処理がキャンセルされました")]
    Cancelled,

    #[error("写真アップロードエラー: {0}")]
    Upload(String),

    #[error("認識エラー: {0}")]
    Recognition(String),

    #[error("出荷IDが不正です: {0}")]
    InvalidIdentifier(String),

    #[error("写真ファイルが不正です: {0}")]
    InvalidPhoto(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("この状態では実行できません: {0}")]
    InvalidState(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Common(#[from] fastpack_common::Error),
}

pub type Result<T> = std::result::Result<T, FastPackError>;
