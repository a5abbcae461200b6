use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fastpack")]
#[command(about = "出荷梱包ステーション用クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ログインしてトークンを保存
    Login {
        /// メールアドレス
        #[arg(short, long, required = true)]
        email: String,

        /// パスワード（省略時は入力を求める）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// ユーザー登録してトークンを保存
    Register {
        /// 表示名
        #[arg(short, long, required = true)]
        name: String,

        /// メールアドレス
        #[arg(short, long, required = true)]
        email: String,

        /// パスワード（省略時は入力を求める）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// 保存済みトークンを削除
    Logout,

    /// 梱包待ち出荷の集計を表示
    Summary {
        /// 出力形式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// 条件を指定して出荷を検索
    Shipments {
        /// 追跡番号
        #[arg(short, long)]
        tracking_number: Option<String>,

        /// ステータス
        #[arg(short, long)]
        status: Option<String>,

        /// 複数ステータス（カンマ区切り）
        #[arg(long, value_delimiter = ',')]
        statuses: Vec<String>,

        /// 注文ID
        #[arg(long)]
        order_id: Option<String>,

        /// 出品者ID
        #[arg(long)]
        sender_id: Option<u64>,

        /// 期間開始 (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,

        /// 期間終了 (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,

        /// ページ番号
        #[arg(long)]
        page: Option<u32>,

        /// 1ページあたりの件数
        #[arg(short, long)]
        limit: Option<u32>,

        /// 出力形式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// 出荷を1件表示
    Show {
        /// 出荷ID（11桁）
        #[arg(required = true)]
        id: String,

        /// 出力形式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// 梱包ステーションを起動（スキャン → 写真 → 保存）
    ///
    /// Ctrl-C は通信中なら即座に、入力待ちの間は Enter の後に中断する。
    Pack {
        /// 梱包写真フォルダ（省略時は設定値）
        #[arg(short, long)]
        capture_folder: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// バックエンドのベースURL
        #[arg(long)]
        base_url: Option<String>,

        /// 写真ストレージのcloud名
        #[arg(long)]
        cloud_name: Option<String>,

        /// アップロードプリセット
        #[arg(long)]
        upload_preset: Option<String>,

        /// アップロード先フォルダ
        #[arg(long)]
        folder: Option<String>,

        /// 梱包写真フォルダ
        #[arg(long)]
        capture_folder: Option<PathBuf>,

        /// 通信タイムアウト（秒）
        #[arg(long)]
        timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
