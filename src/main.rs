use anyhow::{bail, Context};
use clap::Parser;
use indicatif::ProgressBar;
use product_lens::{catalog, cli, config, gateway, picker, report, upload, workflow};
use product_lens_common::empty_catalog_message;
use cli::{Cli, Commands};
use config::Config;
use gateway::AwsCliGateway;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{warn, Level};
use workflow::{AnalysisWorkflow, Event, Session, WorkflowState};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, model, pick, output } => {
            println!("🔍 product-lens - 画像解析\n");
            analyze(&config, &image, model, pick, output).await?;
        }

        Commands::Models { start, units, stop } => {
            let gateway = AwsCliGateway::new(&config);

            if let Some(version) = start {
                let status = catalog::start_version(&gateway, &version, units).await?;
                println!("✔ 起動を要求しました: {} [{}]", version, status.status);
                return Ok(());
            }
            if let Some(version) = stop {
                let status = catalog::stop_version(&gateway, &version).await?;
                println!("✔ 停止を要求しました: {} [{}]", version, status.status);
                return Ok(());
            }

            let versions = catalog::load_catalog(&gateway).await?;

            println!("モデルバージョン ({}件):", versions.len());
            for entry in versions.entries() {
                let mark = if entry.is_usable() { "✔" } else { "-" };
                println!("  {} {} [{}]", mark, entry.display_name(), entry.state);
                println!("      {}", entry.id);
            }
            if versions.usable().is_empty() {
                println!("\n⚠ {}", empty_catalog_message());
                println!("  `product-lens models --start <ID>` で起動できます");
            }
        }

        Commands::Config { set_model, set_description_model, show } => {
            let mut config = config;

            if let Some(model) = set_model {
                config.set_model_version(model)?;
                println!("✔ モデルバージョンを設定しました");
            }

            if let Some(model) = set_description_model {
                config.set_description_model(model)?;
                println!("✔ 説明生成モデルを設定しました");
            }

            if show {
                println!("設定:");
                let model_version = config.model_version.as_deref().unwrap_or("未設定");
                println!("  モデルバージョン: {}", model_version);
                println!("  説明生成モデル: {}", config.description_model);
                println!("  最大トークン数: {}", config.max_tokens);
                println!("  コマンド: {}", config.aws_command);
            }
        }
    }

    Ok(())
}

async fn analyze(
    config: &Config,
    image: &Path,
    model: Option<String>,
    pick: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let gateway = Rc::new(AwsCliGateway::new(config));
    let preferred = model.or_else(|| config.model_version.clone());
    let workflow = AnalysisWorkflow::new(preferred);
    let mut session = Session::new(workflow, gateway.clone(), gateway.clone());

    // 1. モデル一覧
    println!("[1/3] モデル一覧を取得中...");
    session.load_catalog(&*gateway).await;

    if pick {
        if let Some(catalog) = session.workflow().catalog().filter(|c| !c.is_empty()) {
            let choice = picker::pick_model(catalog, session.workflow().model())?;
            session.select_model(choice);
        }
    }
    if let Some(model) = session.workflow().model() {
        println!("✔ モデル: {}\n", model);
    }

    // 2. 画像読み込み（検証はワークフロー側）
    println!("[2/3] 画像を読み込み中...");
    match upload::read_image_file(image) {
        Ok(file) => session.upload(file.data_url, file.byte_size),
        Err(e) => {
            warn!(error = %e, "image could not be read");
            session.dispatch(Event::ImageReadFailed);
        }
    }

    // 3. 解析
    if session.in_flight() > 0 {
        println!("[3/3] 解析中...");
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("ラベル検出・商品説明生成");
        spinner.enable_steady_tick(Duration::from_millis(120));
        session.settle().await;
        spinner.finish_and_clear();
    }

    let workflow = session.workflow();
    match workflow.state() {
        WorkflowState::Processed => {
            if let Some(detection) = workflow.detection() {
                println!("✔ 検出ラベル ({}件):", detection.len());
                for label in detection.labels() {
                    println!("  - {} ({:.1}%)", label.name, label.confidence);
                }
            }
            if let Some(description) = workflow.description() {
                println!("\n商品説明:\n{}", description.text);
            }

            if let Some(path) = output {
                if let Some(report) = report::AnalysisReport::from_workflow(workflow) {
                    let json = serde_json::to_string_pretty(&report)?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("結果の保存に失敗: {}", path.display()))?;
                    println!("\n✔ 結果を保存: {}", path.display());
                }
            }
            println!("\n✅ 解析完了");
        }
        WorkflowState::Error => {
            let banner = workflow.banner().unwrap_or_default();
            eprintln!("{}", banner);
            eprintln!("再試行するには画像を再度指定してください。");
            bail!(banner);
        }
        other => {
            bail!("解析が開始されませんでした (state: {})", other.as_str());
        }
    }

    Ok(())
}
