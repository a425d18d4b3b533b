use anyhow::Result;
use std::path::PathBuf;

use stockflow::{Scenario, ScenarioRun, StockflowConfig};

pub struct ScenarioCommand {
    pub file: PathBuf,
    pub show_audit: bool,
}

impl ScenarioCommand {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            show_audit: false,
        }
    }

    pub fn with_audit(mut self, show_audit: bool) -> Self {
        self.show_audit = show_audit;
        self
    }

    pub async fn execute(&self, config: &StockflowConfig) -> Result<()> {
        let scenario = Scenario::load(&self.file)?;
        println!(
            "▶️  Running scenario {} ({} step(s))",
            scenario.name.as_deref().unwrap_or("unnamed"),
            scenario.steps.len()
        );
        println!();

        let run = scenario.run(&config.workflow).await?;
        print_outcomes(&run);
        print_ledger(&run);
        if self.show_audit {
            print_audit(&run);
        }
        if config.observability.metrics_enabled {
            run.service.log_stats();
            let stats = run.service.stats();
            println!("📊 METRICS:");
            println!("   {}", serde_json::to_string(&stats)?);
            println!();
        }

        let unexpected = run
            .outcomes
            .iter()
            .filter(|o| !o.met_expectation())
            .count();
        if unexpected > 0 {
            anyhow::bail!("scenario had {} unexpected outcome(s)", unexpected);
        }
        println!("✅ All steps ended as expected");
        Ok(())
    }
}

fn print_outcomes(run: &ScenarioRun) {
    println!("📋 STEPS:");
    println!("────────");
    for outcome in &run.outcomes {
        let icon = if outcome.met_expectation() { "✅" } else { "❌" };
        println!("{} {}", icon, outcome);
    }
    println!();
}

fn print_ledger(run: &ScenarioRun) {
    println!("📦 LEDGER:");
    println!("─────────");
    let snapshot = run.ledger.snapshot();
    if snapshot.is_empty() {
        println!("   (empty)");
    }
    for (batch, entry) in snapshot {
        let mut flags = Vec::new();
        if entry.quarantined {
            flags.push("quarantined");
        }
        if entry.condemned {
            flags.push("condemned");
        }
        println!("   {} = {} {}", batch, entry.quantity, flags.join(" "));
    }
    println!();
}

fn print_audit(run: &ScenarioRun) {
    println!("🧾 AUDIT:");
    println!("────────");
    for entry in run.audit.entries() {
        println!(
            "   {} [{}] {} {}: {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.severity,
            entry.actor,
            entry.action,
            entry.details
        );
    }
    println!();
}
