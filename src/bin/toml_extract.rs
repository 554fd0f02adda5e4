use clap::Parser;
use coo_extract::core::ConfigProvider;
use coo_extract::utils::error::ErrorSeverity;
use coo_extract::utils::{logger, validation::Validate};
use coo_extract::{
    DocumentProcessor, EtlEngine, ExtractionPipeline, GeminiClient, LocalStorage, TomlConfig,
    WhispererClient,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-extract")]
#[command(about = "Certificate of Origin extraction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "coo-extract.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override batch.concurrent_requests from config
    #[arg(long)]
    concurrency: Option<usize>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based extraction tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(concurrency) = args.concurrency {
        config.batch.concurrent_requests = Some(concurrency);
        tracing::info!("🔧 Concurrency overridden to: {}", concurrency);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    tracing::debug!("TOML config: {:?}", config);

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let text_extractor = WhispererClient::new(config.whisperer_config())?;
    let model = GeminiClient::new(config.gemini_config())?;
    let processor = DocumentProcessor::new(Arc::new(text_extractor), Arc::new(model));

    let pipeline = ExtractionPipeline::new(LocalStorage::new(""), config, processor);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!(
                "✅ {} document(s): {} successful, {} failed",
                report.total(),
                report.successful(),
                report.failed()
            );
            for output in &report.outputs {
                println!("📁 Output saved to: {}", output);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Extraction: {}", config.extraction.name);
    if let Some(description) = &config.extraction.description {
        println!("  Description: {}", description);
    }
    println!("  Documents: {}", config.input_files().len());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Concurrent Requests: {}", config.concurrent_requests());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📄 Documents:");
    for input in config.input_files() {
        println!("  - {}", input);
    }

    let whisperer = config.whisperer_config();
    let gemini = config.gemini_config();
    println!();
    println!("📡 Services:");
    println!(
        "  OCR: {} (wait up to {:?})",
        whisperer.endpoint, whisperer.wait_timeout
    );
    println!(
        "  Model: {} @ {} (temperature {})",
        gemini.model, gemini.endpoint, gemini.temperature
    );
    if let Some(limit) = config.document_timeout() {
        println!("  Per-document timeout: {:?}", limit);
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    match config.output_stem() {
        Some(stem) => println!("  File name: {}", stem),
        None => println!("  File name: timestamped"),
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
