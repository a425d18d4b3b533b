use anyhow::Result;
use std::path::PathBuf;

use stockflow::StockflowConfig;

pub struct ConfigCommand {
    pub output: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn execute(&self, config: &StockflowConfig) -> Result<()> {
        match &self.output {
            Some(path) => {
                config.save_to_file(path)?;
                println!("✅ Configuration written to {}", path.display());
            }
            None => print!("{}", config.to_toml()?),
        }
        Ok(())
    }
}
