use clap::Parser;
use coo_extract::core::ConfigProvider;
use coo_extract::utils::error::ErrorSeverity;
use coo_extract::utils::{logger, validation::Validate};
use coo_extract::{
    CliConfig, DocumentProcessor, EtlEngine, ExtractionPipeline, GeminiClient, LocalStorage,
    RunReport, WhispererClient,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting coo-extract CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    let show_records = config.show_records;

    // 建立外部服務與處理器
    let text_extractor = WhispererClient::new(config.whisperer_config())?;
    let model = GeminiClient::new(config.gemini_config())?;
    let processor = DocumentProcessor::new(Arc::new(text_extractor), Arc::new(model));

    // 輸入路徑照原樣解析，輸出寫到 output_path 之下
    let storage = LocalStorage::new("");
    let pipeline = ExtractionPipeline::new(storage, config, processor);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Extraction completed successfully!");
            print_report(&report, show_records);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
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

fn print_dry_run(config: &CliConfig) {
    println!("🔍 Dry Run Analysis:");
    println!("  Documents ({}):", config.input_files().len());
    for input in config.input_files() {
        println!("    - {}", input);
    }
    println!("  OCR endpoint: {}", config.whisperer_endpoint);
    println!("  Model: {} @ {}", config.gemini_model, config.gemini_endpoint);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Concurrent Requests: {}", config.concurrent_requests());
    println!();
    println!("✅ Dry run analysis complete. No documents were sent to any service.");
}

fn print_report(report: &RunReport, show_records: bool) {
    if show_records {
        for result in report.table.results() {
            println!("{}", result.summary());
        }
    }

    println!("📊 Total: {}", report.total());
    println!("✅ Successful: {}", report.successful());
    println!("❌ Failed: {}", report.failed());
    for result in report.table.results() {
        if let Some(reason) = result.status.reason() {
            println!("  ⚠️ {}: {}", result.document_id, reason);
        }
    }
    for output in &report.outputs {
        println!("📁 Output saved to: {}", output);
    }
}
