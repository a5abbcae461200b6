use clap::Parser;
use dialoguer::Password;
use fastpack::{api, cli, config, error, output, station};
use api::{ApiClient, AuthClient, ShipmentBackend};
use cli::{Cli, Commands};
use config::Config;
use error::{FastPackError, Result};
use fastpack_common::{analyze, Credentials, ShipmentId, ShipmentQuery};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    // RUST_LOG があればそちらを優先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "fastpack=debug,fastpack_common=debug"
        } else {
            "info"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_password(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let prompt = Password::new().with_prompt("パスワード");
    let prompt = if confirm {
        prompt.with_confirmation("パスワード（確認）", "パスワードが一致しません")
    } else {
        prompt
    };
    prompt
        .interact()
        .map_err(|e| FastPackError::Prompt(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Login { email, password } => {
            println!("🔑 fastpack - ログイン\n");

            let credentials = Credentials {
                name: None,
                email,
                password: read_password(password, false)?,
            };
            let auth = AuthClient::from_config(&config)?.login(&credentials).await?;

            let mut config = config;
            config.set_token(auth.token.unwrap_or_default())?;

            let name = auth
                .user
                .and_then(|u| u.name.or(u.email))
                .unwrap_or(credentials.email);
            println!("✔ ログインしました: {}", name);
        }

        Commands::Register { name, email, password } => {
            println!("📝 fastpack - ユーザー登録\n");

            let credentials = Credentials {
                name: Some(name),
                email,
                password: read_password(password, true)?,
            };
            let auth = AuthClient::from_config(&config)?.register(&credentials).await?;

            let mut config = config;
            config.set_token(auth.token.unwrap_or_default())?;
            println!("✔ 登録しました: {}", credentials.email);
        }

        Commands::Logout => {
            let mut config = config;
            if config.auth_token.is_some() {
                config.clear_token()?;
                println!("✔ ログアウトしました");
            } else {
                println!("ログインしていません");
            }
        }

        Commands::Summary { format } => {
            config.require_token()?;
            let client = ApiClient::from_config(&config)?;
            let shipments = client.shipments_for_packing().await?;
            output::print_summary(&analyze(&shipments), format)?;
        }

        Commands::Shipments {
            tracking_number,
            status,
            statuses,
            order_id,
            sender_id,
            date_from,
            date_to,
            page,
            limit,
            format,
        } => {
            config.require_token()?;
            let query = ShipmentQuery {
                tracking_number,
                status,
                statuses: (!statuses.is_empty()).then(|| statuses.join(",")),
                order_id,
                sender_id,
                date_from,
                date_to,
                page,
                limit,
            };
            let client = ApiClient::from_config(&config)?;
            let shipments = client.find_shipments(&query).await?;
            output::print_shipments(&shipments, format)?;
        }

        Commands::Show { id, format } => {
            config.require_token()?;
            let id = ShipmentId::parse(id.trim())?;
            let client = ApiClient::from_config(&config)?;
            match client.get_shipment(id).await? {
                Some(record) => output::print_shipment(&record, format)?,
                None => println!("出荷が見つかりません: {}", id),
            }
        }

        Commands::Pack { capture_folder } => {
            println!("📦 fastpack - 梱包ステーション\n");

            let station = station::PackStation::from_config(&config, capture_folder)?;
            let packed = station.run().await?;

            println!("\n✅ 終了（保存 {}件）", packed);
        }

        Commands::Config {
            base_url,
            cloud_name,
            upload_preset,
            folder,
            capture_folder,
            timeout,
            show,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(url) = base_url {
                config.base_url = url;
                changed = true;
            }
            if let Some(name) = cloud_name {
                config.cloud_name = Some(name);
                changed = true;
            }
            if let Some(preset) = upload_preset {
                config.upload_preset = preset;
                changed = true;
            }
            if let Some(folder) = folder {
                config.upload_folder = folder;
                changed = true;
            }
            if let Some(path) = capture_folder {
                config.capture_folder = Some(path);
                changed = true;
            }
            if let Some(seconds) = timeout {
                config.timeout_seconds = seconds;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  ベースURL: {}", config.base_url());
                println!("  cloud名: {}", config.cloud_name.as_deref().unwrap_or("未設定"));
                println!("  アップロードプリセット: {}", config.upload_preset);
                println!("  アップロード先フォルダ: {}", config.upload_folder);
                println!(
                    "  撮影フォルダ: {}",
                    config
                        .capture_folder
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
                println!("  タイムアウト: {}秒", config.timeout().as_secs());
                println!("  ログイン: {}", if config.token().is_some() { "済み" } else { "未ログイン" });
            }
        }
    }

    Ok(())
}
