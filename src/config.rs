use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for stockflow
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StockflowConfig {
    /// Workflow rules
    pub workflow: WorkflowConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Digits in each keeper/controller handoff code
    pub code_length: usize,
    /// Auto-cancel transfers left in DISPATCHED this long (disabled when unset)
    pub dispatch_ttl_hours: Option<u64>,
    /// Let the keeper who received a transfer also verify it
    pub allow_same_person_verification: bool,
    /// Enforce the role table (otherwise every actor is permitted)
    pub enforce_roles: bool,
}

/// Longest accepted dispatch TTL: one hundred years
pub const MAX_DISPATCH_TTL_HOURS: u64 = 24 * 365 * 100;

impl WorkflowConfig {
    pub fn validate(&self) -> Result<()> {
        if !(4..=12).contains(&self.code_length) {
            anyhow::bail!(
                "workflow.code_length must be between 4 and 12, got {}",
                self.code_length
            );
        }
        match self.dispatch_ttl_hours {
            Some(0) => anyhow::bail!("workflow.dispatch_ttl_hours must be positive when set"),
            Some(hours) if hours > MAX_DISPATCH_TTL_HOURS => anyhow::bail!(
                "workflow.dispatch_ttl_hours must be at most {}, got {}",
                MAX_DISPATCH_TTL_HOURS,
                hours
            ),
            _ => Ok(()),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            dispatch_ttl_hours: None,
            allow_same_person_verification: false,
            enforce_roles: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
    /// Enable metrics collection
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
            metrics_enabled: true,
        }
    }
}

impl StockflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (stockflow.toml in the working directory)
    /// 3. Environment variables (prefixed with STOCKFLOW_, nested with __)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("stockflow.toml"))
    }

    /// Same as `load` but with an explicit configuration file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Override with environment variables, e.g. STOCKFLOW_WORKFLOW__CODE_LENGTH=8
        builder = builder.add_source(
            Environment::with_prefix("STOCKFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let stockflow_config: StockflowConfig = config.try_deserialize()?;
        stockflow_config.validate()?;
        Ok(stockflow_config)
    }

    pub fn validate(&self) -> Result<()> {
        self.workflow.validate()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<StockflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = StockflowConfig::load_env_file();
        StockflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static StockflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
