use anyhow::Context;
use clap::Parser;
use shortname_gen::app::{api, batch, display, interactive};
use shortname_gen::config::{AppConfig, CliConfig, Command};
use shortname_gen::utils::error::{ErrorSeverity, ShortNameError};
use shortname_gen::utils::{logger, validation::Validate};
use shortname_gen::ShortNameProcessor;
use std::io::{self, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌；serve 模式輸出 JSON 日誌
    if matches!(cli.command, Command::Serve) {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting shortname-gen CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 讀取並驗證配置
    let config = match cli.app_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let processor = match build_processor(&config) {
        Ok(processor) => Arc::new(processor),
        Err(e) => exit_with(e),
    };

    if let Err(e) = run(&cli.command, &config, processor).await {
        match e.downcast::<ShortNameError>() {
            Ok(e) => exit_with(e),
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// 詞典載入失敗不致命：警告後以無詞典模式繼續
fn build_processor(config: &AppConfig) -> shortname_gen::Result<ShortNameProcessor> {
    let mut without_dictionary = config.clone();
    without_dictionary.dictionary.path = None;
    let processor = ShortNameProcessor::from_config(&without_dictionary)?;

    if let Some(path) = config.dictionary_path() {
        match processor.load_dictionary(path) {
            Ok(status) => tracing::info!("📚 {}", display::render_status(&status)),
            Err(e) => {
                tracing::warn!("⚠️ {} ({})", e, e.recovery_suggestion());
                eprintln!("⚠️ {}", e.user_friendly_message());
            }
        }
    }

    Ok(processor)
}

async fn run(
    command: &Command,
    config: &AppConfig,
    processor: Arc<ShortNameProcessor>,
) -> anyhow::Result<()> {
    match command {
        Command::Generate { description, json } => {
            let description = description.join(" ");
            let result = processor.process_full_description(&description)?;
            if *json {
                let response = api::GenerateResponse::from(&result);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", display::render_result(&result, processor.budget()));
            }
        }
        Command::Batch {
            input,
            output,
            json,
            ..
        } => {
            let descriptions = batch::read_descriptions(input)
                .with_context(|| format!("failed to read descriptions from {}", input))?;
            let report =
                batch::run_concurrent(processor, descriptions, config.batch.concurrency).await?;

            match output {
                Some(path) => {
                    batch::write_report_csv(&report, path)?;
                    println!("📁 Results saved to: {}", path);
                }
                None if *json => println!("{}", serde_json::to_string_pretty(&report)?),
                None => {
                    for item in &report.results {
                        match &item.error {
                            Some(error) => println!("❌ {} | {}", item.original, error),
                            None => println!(
                                "{} | {} ({})",
                                item.original, item.short_name, item.character_count
                            ),
                        }
                    }
                }
            }
            println!("✅ {}/{} succeeded", report.succeeded, report.count);
        }
        Command::Interactive => {
            let stdin = io::stdin();
            interactive::run_interactive(&processor, stdin.lock(), io::stdout())?;
        }
        Command::Status => {
            let status = processor.status();
            println!("{}", display::render_status(&status));
            println!("🔢 Character budget: {}", processor.budget());
            println!("🧩 Positions: {}", processor.schema().len());
        }
        Command::Serve => {
            tracing::info!("🚀 Serving JSON requests on stdin");
            let stdin = io::stdin();
            let handled = api::serve(&processor, stdin.lock(), io::stdout())?;
            tracing::info!("Served {} requests", handled);
        }
    }

    io::stdout().flush()?;
    Ok(())
}

fn exit_with(e: ShortNameError) -> ! {
    tracing::error!(
        "❌ Processing failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
