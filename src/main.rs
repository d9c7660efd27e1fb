use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use webp_converter::client::{self, DirLocators, RemoteClient, RemoteLocators};
use webp_converter::encoder::WebpCompressor;
use webp_converter::{cli, config, scanner, server};
use webp_converter_common::{
    Admission, CompressionQuality, FileRegistry, IncomingFile, JobOutcome, LocatorStore, Session,
};
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Serve { port, staging_dir, output_dir, public_dir } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = staging_dir {
                config.staging_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(dir) = public_dir {
                config.public_dir = Some(dir);
            }

            println!("🌐 webp-converter - 変換サーバー\n");
            println!("  ステージング: {}", config.staging_dir.display());
            println!("  出力: {}", config.output_dir.display());
            println!("  URL: http://{}:{}/\n", config.host, config.port);

            server::serve(&config).await?;
        }

        Commands::Convert { paths, quality, output, allow_webp } => {
            println!("🖼  webp-converter - ローカル変換\n");

            let quality = CompressionQuality::clamped(quality.unwrap_or(config.default_quality) as i64);
            let registry = FileRegistry::new(DirLocators::new(&output)?).with_webp_input(allow_webp);
            let mut session = Session::new(registry).with_quality(quality);

            // 1. 読み込み
            println!("[1/3] 画像を読み込み中...");
            register(&mut session, &paths)?;
            println!("✔ {}\n", session.registry().summary());

            // 2. 変換
            println!("[2/3] 変換中... (品質 {})", quality);
            let total = session.registry().len() as u64;
            let session = client::driver::shared(session);
            let bar = progress_bar(total);
            let on_done = {
                let bar = bar.clone();
                move |name: &str, outcome: &JobOutcome| {
                    bar.set_message(name.to_string());
                    if let JobOutcome::Failed(reason) = outcome {
                        bar.println(format!("✖ {}: {}", name, reason));
                    }
                    bar.inc(1);
                }
            };
            client::convert_all(&session, Arc::new(WebpCompressor), on_done).await?;
            bar.finish_and_clear();
            println!("✔ 変換完了\n");

            // 3. 結果
            println!("[3/3] 結果");
            let session = session.lock().map_err(|_| anyhow::anyhow!("セッションが破損しました"))?;
            print_rows(session.registry());
            println!("\n✅ 出力先: {}", output.display());
        }

        Commands::Remote { paths, server, quality } => {
            println!("☁  webp-converter - アップロード変換\n");

            let quality = CompressionQuality::clamped(quality.unwrap_or(config.default_quality) as i64);
            let remote = RemoteClient::new(&server)?;
            let registry = FileRegistry::new(RemoteLocators::new(remote.base().clone()));
            let mut session = Session::new(registry).with_quality(quality);

            // 1. 読み込み
            println!("[1/3] 画像を読み込み中...");
            register(&mut session, &paths)?;
            println!("✔ {}\n", session.registry().summary());

            // 2. アップロード・変換
            println!("[2/3] アップロード・変換中... ({})", remote.base());
            let outcomes = client::convert_remote(&mut session, &remote).await?;
            for (name, outcome) in &outcomes {
                match outcome {
                    JobOutcome::Converted(artifact) => println!("✔ {} → {}", name, artifact.locator),
                    JobOutcome::Failed(reason) => println!("✖ {}: {}", name, reason),
                    JobOutcome::Discarded => {}
                }
            }
            println!();

            // 3. 結果
            println!("[3/3] 結果");
            print_rows(session.registry());
            println!("\n✅ 完了");
        }

        Commands::Config { set_port, show } => {
            if let Some(port) = set_port {
                config.set_port(port)?;
                println!("✔ ポートを設定しました: {}", port);
            }

            if show {
                println!("設定:");
                println!("  ホスト: {}", config.host);
                println!("  ポート: {}", config.port);
                println!("  ステージング: {}", config.staging_dir.display());
                println!("  出力: {}", config.output_dir.display());
                match &config.public_dir {
                    Some(dir) => println!("  公開フォルダ: {}", dir.display()),
                    None => println!("  公開フォルダ: なし"),
                }
                println!("  既定の品質: {}", config.default_quality);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// パスを展開してレジストリに登録する。検証エラーはその場で表示する。
fn register<L: LocatorStore>(session: &mut Session<L>, paths: &[PathBuf]) -> anyhow::Result<()> {
    let inputs = scanner::collect_inputs(paths)?;

    let mut incoming = Vec::new();
    for path in &inputs {
        match IncomingFile::from_path(path) {
            Ok(file) => incoming.push(file),
            Err(e) => println!("✖ {}: {}", path.display(), e),
        }
    }

    for (name, result) in session.registry_mut().accept_all(incoming) {
        match result {
            Ok(Admission::Registered) => {}
            Ok(Admission::Duplicate) => println!("- {} は登録済みのためスキップ", name),
            Err(e) => println!("✖ {}", e),
        }
    }

    Ok(())
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}

fn print_rows<L: LocatorStore>(registry: &FileRegistry<L>) {
    for row in registry.rows() {
        println!(
            "  {:<30} {:>12} → {:>12}  {}",
            row.file_name, row.original_size, row.converted_size, row.compression
        );
    }
}
