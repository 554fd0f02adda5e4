use crate::core::Pipeline;
use crate::domain::model::ResultTable;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 一次批次執行的摘要
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: ResultTable,
    pub outputs: Vec<String>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.table.len()
    }

    pub fn successful(&self) -> usize {
        self.table.successful()
    }

    pub fn failed(&self) -> usize {
        self.table.failed()
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting extraction run...");
        self.monitor.log_stats("Start");

        // Extract
        let documents = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded {} document(s)", documents.len());
        self.monitor.log_stats("Extract");

        // Transform
        let table = self.pipeline.transform(documents).await?;
        tracing::info!(
            "📊 Processed {} document(s): {} successful, {} failed",
            table.len(),
            table.successful(),
            table.failed()
        );
        self.monitor.log_stats("Transform");

        // Load
        let outputs = self.pipeline.load(&table).await?;
        for output in &outputs {
            tracing::info!("📁 Output saved to: {}", output);
        }
        self.monitor.log_final_stats();

        Ok(RunReport { table, outputs })
    }
}
