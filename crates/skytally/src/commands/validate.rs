use colored::Colorize;
use skytally_config::{InventoryConfig, find_config_file};
use skytally_core::ServiceKind;
use skytally_sheets::google::ACCESS_TOKEN_ENV;
use std::path::Path;

pub fn handle(config: &InventoryConfig, path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating configuration...".blue());

    let source = path.map(|p| Ok(p.to_path_buf())).unwrap_or_else(find_config_file);
    match source {
        Ok(path) => println!("Config file: {}", path.display().to_string().cyan()),
        Err(_) => println!("Config file: {}", "(none, environment only)".dimmed()),
    }

    let mut problems = config.problems();
    if !std::env::var(ACCESS_TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
        problems.push(format!("{} is not set", ACCESS_TOKEN_ENV));
    }

    if !problems.is_empty() {
        eprintln!();
        eprintln!("{}", "✗ Configuration errors".red().bold());
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        anyhow::bail!("{} configuration problem(s)", problems.len());
    }

    println!("{}", "✓ Configuration is valid".green().bold());
    println!();
    println!("Summary:");
    println!("  Accounts: {}", config.accounts.len());
    for account in &config.accounts {
        let external = if account.external_id.is_some() { " (external id)" } else { "" };
        println!("    - {} {}{}", account.account_id.cyan(), account.role_arn, external);
    }
    let services = ServiceKind::parse_selection(&config.services)?;
    println!(
        "  Services: {}",
        services.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    );
    match &config.regions {
        Some(regions) => println!("  Regions: {}", regions.join(", ")),
        None => println!("  Regions: full catalogue"),
    }
    println!("  Default region: {}", config.default_region);
    println!(
        "  Concurrency: {} (unit timeout {}s)",
        config.concurrency, config.unit_timeout_secs
    );
    Ok(())
}
