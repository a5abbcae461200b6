//! 対話式梱包ステーション
//!
//! ハンディスキャナ（キーボード入力）で出荷IDを読み取り、
//! 梱包写真を選んでアップロード・保存するまでを繰り返す。

use crate::api::{ApiClient, CloudinaryStorage, PhotoStorage, ShipmentBackend};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{FastPackError, Result};
use crate::output;
use crate::photo;
use crate::scanner::{BarcodeDecoder, LineRecognizer, ScannerControl};
use crate::workflow::{
    ConfirmOutcome, ScanState, ScanWorkflowController, UploadOutcome, WorkflowOptions,
    WorkflowSignal,
};
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// スキャン入力の解釈
#[derive(Debug, PartialEq, Eq)]
pub enum ScanAction {
    /// スキャナからの1行
    Line(String),
    /// 終了
    Quit,
}

/// 写真入力の解釈
#[derive(Debug, PartialEq, Eq)]
pub enum PhotoAction {
    /// 指定パスの写真
    Path(PathBuf),
    /// 撮影フォルダの最新写真
    Latest,
    /// この出荷をスキップ
    Skip,
    /// 終了
    Quit,
}

pub fn parse_scan_answer(input: &str) -> ScanAction {
    match input.trim() {
        "q" | "Q" => ScanAction::Quit,
        _ => ScanAction::Line(input.to_string()),
    }
}

pub fn parse_photo_answer(input: &str) -> PhotoAction {
    match input.trim() {
        "" => PhotoAction::Latest,
        "s" | "S" => PhotoAction::Skip,
        "q" | "Q" => PhotoAction::Quit,
        path => PhotoAction::Path(PathBuf::from(path.trim_matches('"'))),
    }
}

async fn prompt_text(prompt: &'static str) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| FastPackError::Prompt(e.to_string()))
    })
    .await
    .map_err(|e| FastPackError::Prompt(e.to_string()))?
}

async fn prompt_confirm(prompt: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| FastPackError::Prompt(e.to_string()))
    })
    .await
    .map_err(|e| FastPackError::Prompt(e.to_string()))?
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// 写真入力から実ファイルを決定
fn resolve_photo(action: PhotoAction, capture_folder: Option<&Path>) -> Result<Option<PathBuf>> {
    match action {
        PhotoAction::Path(path) => photo::validate_photo(&path).map(Some),
        PhotoAction::Latest => {
            let folder = capture_folder.ok_or_else(|| {
                FastPackError::Config(
                    "撮影フォルダが未設定です。パスを入力するか `fastpack config --capture-folder` で設定してください".into(),
                )
            })?;
            match photo::latest_photo(folder)? {
                Some(path) => Ok(Some(path)),
                None => Err(FastPackError::FileNotFound(format!(
                    "{} に写真がありません",
                    folder.display()
                ))),
            }
        }
        PhotoAction::Skip | PhotoAction::Quit => Ok(None),
    }
}

pub struct PackStation {
    controller: ScanWorkflowController,
    decoder: Arc<BarcodeDecoder<LineRecognizer>>,
    signals: mpsc::UnboundedReceiver<WorkflowSignal>,
    capture_folder: Option<PathBuf>,
    packed: usize,
}

impl PackStation {
    pub fn new(
        backend: Arc<dyn ShipmentBackend>,
        storage: Arc<dyn PhotoStorage>,
        options: WorkflowOptions,
        capture_folder: Option<PathBuf>,
    ) -> Result<Self> {
        let decoder = Arc::new(BarcodeDecoder::new(LineRecognizer));
        let scanner: Arc<dyn ScannerControl> = decoder.clone();
        let mut controller =
            ScanWorkflowController::new(backend, storage, options).with_scanner(scanner);
        let signals = controller
            .signals()
            .ok_or_else(|| FastPackError::InvalidState("通知チャネルが取得済みです".into()))?;

        Ok(Self {
            controller,
            decoder,
            signals,
            capture_folder,
            packed: 0,
        })
    }

    pub fn from_config(config: &Config, capture_folder: Option<PathBuf>) -> Result<Self> {
        config.require_token()?;
        let backend = Arc::new(ApiClient::from_config(config)?);
        let storage = Arc::new(CloudinaryStorage::from_config(config)?);
        let capture_folder = capture_folder.or_else(|| config.capture_folder.clone());
        Self::new(
            backend,
            storage,
            WorkflowOptions::from_config(config),
            capture_folder,
        )
    }

    pub async fn run(mut self) -> Result<usize> {
        let cancel = self.controller.cancel_handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let result = self.run_loop().await;

        self.controller.close();
        interrupt.abort();
        result.map(|_| self.packed)
    }

    async fn run_loop(&mut self) -> Result<()> {
        // 端末入力が無ければスキャナを使えない
        self.controller
            .on_permission_result(std::io::stdin().is_terminal());

        println!("操作: スキャン待ちで [q]終了 / 写真入力で [Enter]最新写真 [s]スキップ [q]終了");
        println!("      Ctrl-C は入力中なら Enter の後に中断されます");
        println!("---\n");

        loop {
            if self.controller.is_closed() {
                println!("\n中断しました");
                return Ok(());
            }

            match self.controller.state() {
                ScanState::RequestingPermission => {
                    println!("❌ スキャナ入力（端末）が利用できません");
                    return Ok(());
                }
                ScanState::Idle => self.controller.retry(),
                // 取得が中断された場合のみ残る
                ScanState::Loading => return Ok(()),
                ScanState::Scanning => {
                    if !self.scan_once().await? {
                        return Ok(());
                    }
                }
                ScanState::NoResult { scanned_code } => {
                    println!("⚠ 出荷が見つかりません: {}\n", scanned_code);
                    self.controller.retry();
                }
                ScanState::Error { message } => {
                    println!("❌ {}\n", message);
                    self.controller.retry();
                }
                ScanState::ShowResult {
                    record,
                    pending_photo,
                    upload_outcome,
                    ..
                } => {
                    if upload_outcome == Some(UploadOutcome::Success) {
                        self.advance();
                        continue;
                    }
                    if upload_outcome.is_none() {
                        println!();
                        output::print_shipment(&record, OutputFormat::Table)?;
                    }
                    if !self.handle_result(pending_photo, upload_outcome).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// 1回分のスキャン入力（終了指示で false）
    async fn scan_once(&mut self) -> Result<bool> {
        let answer = prompt_text("スキャン").await?;
        let Some(answer) = self.answered(answer) else {
            return Ok(false);
        };
        let line = match parse_scan_answer(&answer) {
            ScanAction::Quit => return Ok(false),
            ScanAction::Line(line) => line,
        };

        let Some(code) = self.decoder.submit_frame(line) else {
            println!("  → 出荷IDとして読み取れませんでした（11桁の数字）");
            return Ok(true);
        };

        let pb = spinner(&format!("{} を取得中...", code.value));
        self.controller.on_code_scanned(&code.value).await;
        pb.finish_and_clear();
        Ok(true)
    }

    async fn handle_result(
        &mut self,
        pending_photo: Option<PathBuf>,
        upload_outcome: Option<UploadOutcome>,
    ) -> Result<bool> {
        if let (Some(path), Some(UploadOutcome::Failure)) = (&pending_photo, upload_outcome) {
            let resend = prompt_confirm(format!("{} を再送信しますか？", path.display())).await?;
            let Some(resend) = self.answered(resend) else {
                return Ok(false);
            };
            if resend {
                return self.upload().await.map(|_| true);
            }
            self.controller.clear_photo();
        }

        let answer = prompt_text("梱包写真").await?;
        let Some(answer) = self.answered(answer) else {
            return Ok(false);
        };
        let action = parse_photo_answer(&answer);
        match action {
            PhotoAction::Quit => return Ok(false),
            PhotoAction::Skip => {
                println!("  → スキップ\n");
                self.controller.go_idle();
                return Ok(true);
            }
            _ => {}
        }

        let path = match resolve_photo(action, self.capture_folder.as_deref()) {
            Ok(Some(path)) => path,
            Ok(None) => return Ok(true),
            Err(e) => {
                println!("  → {}", e);
                return Ok(true);
            }
        };

        self.controller.capture_photo(path.clone());
        let confirmed = prompt_confirm(format!("{} をアップロードしますか？", path.display())).await?;
        let Some(confirmed) = self.answered(confirmed) else {
            return Ok(false);
        };
        if !confirmed {
            self.controller.clear_photo();
            return Ok(true);
        }

        self.upload().await?;
        Ok(true)
    }

    /// 入力待ちの間に中断されていれば None（入力は破棄）
    ///
    /// 入力待ちはブロッキングのため、Ctrl-C は入力確定後に反映される。
    fn answered<T>(&self, answer: T) -> Option<T> {
        if self.controller.is_closed() {
            debug!("interrupted while prompting; input discarded");
            return None;
        }
        Some(answer)
    }

    async fn upload(&mut self) -> Result<()> {
        let pb = spinner("写真をアップロード中...");
        let outcome = self.controller.confirm_photo().await;
        pb.finish_and_clear();

        match outcome {
            Ok(ConfirmOutcome::Persisted(record)) => {
                println!("✔ 梱包写真を保存しました: {}\n", record.id);
            }
            Ok(ConfirmOutcome::UploadFailed { reason }) => {
                println!("❌ アップロードに失敗しました: {}", reason);
            }
            Ok(ConfirmOutcome::PersistFailed { reason, .. }) => {
                println!("❌ 出荷の保存に失敗しました: {}", reason);
            }
            Err(FastPackError::Cancelled) => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn advance(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                WorkflowSignal::ReadyToAdvance { shipment_id } => {
                    debug!("advance after {}", shipment_id);
                    self.packed += 1;
                }
            }
        }
        self.controller.go_idle();
        self.controller.retry();
    }
}
