use anyhow::Result;
use std::path::PathBuf;

use stockflow::{export_csv, ReportKind, Scenario, StockflowConfig};

pub struct ExportCommand {
    pub file: PathBuf,
    pub kind: ReportKind,
}

impl ExportCommand {
    pub fn new(file: PathBuf, kind: ReportKind) -> Self {
        Self { file, kind }
    }

    pub async fn execute(&self, config: &StockflowConfig) -> Result<()> {
        let scenario = Scenario::load(&self.file)?;
        let run = scenario.run(&config.workflow).await?;
        // stdout carries only the CSV so it can be redirected
        print!("{}", export_csv(&run.service, self.kind).await);
        Ok(())
    }
}
