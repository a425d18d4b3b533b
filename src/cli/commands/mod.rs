use anyhow::Result;

pub mod config;
pub mod export;
pub mod scenario;

pub async fn show_usage() -> Result<()> {
    println!("💊 Stockflow - pharmacy stock workflows");
    println!();
    println!("To get started:");
    println!("  ▶️  stockflow scenario <file.toml>   # Run a scripted scenario");
    println!("  📄 stockflow export <file.toml>     # Export the run as CSV");
    println!("  ⚙️  stockflow config                # Show effective configuration");
    println!();
    println!("💡 Scenario files declare actors, opening stock and steps.");
    Ok(())
}
