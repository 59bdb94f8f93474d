use crate::DiffArgs;
use anyhow::Context;
use colored::Colorize;
use skytally_config::InventoryConfig;
use skytally_core::{CompareMode, ServiceKind, SnapshotKey, parse_date};
use skytally_sheets::{DiffOutcome, DiffRequest, GoogleSheetsBackend, GoogleSheetsConfig, diff_tabs};

/// How many keys of each partition are listed before truncating.
const LIST_LIMIT: usize = 20;

pub async fn handle(config: &InventoryConfig, args: DiffArgs) -> anyhow::Result<()> {
    let request = build_request(&args)?;
    let spreadsheet_id = config
        .spreadsheet_id()
        .context("spreadsheet_id is not set (GOOGLE_SHEETS_ID)")?;
    let backend = GoogleSheetsBackend::new(GoogleSheetsConfig::from_env(spreadsheet_id)?)?;

    let outcome = diff_tabs(&backend, &request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        print_outcome(&request, &outcome);
    }
    Ok(())
}

fn build_request(args: &DiffArgs) -> anyhow::Result<DiffRequest> {
    let service: ServiceKind = args.service.parse()?;
    let source = parse_date(&args.source)?;
    let target = parse_date(&args.target)?;

    let mut request = DiffRequest::new(service, source, target);
    if let Some(key) = &args.key {
        request.key = SnapshotKey::single(key.trim());
    }
    if args.compare_fields {
        request.mode = CompareMode::Fields;
    }
    request.highlight = !args.no_highlight;
    Ok(request)
}

fn print_keys(label: colored::ColoredString, keys: &[&String]) {
    println!("{} {}", label, keys.len());
    for key in keys.iter().take(LIST_LIMIT) {
        println!("    {}", key);
    }
    if keys.len() > LIST_LIMIT {
        println!("    ... and {} more", keys.len() - LIST_LIMIT);
    }
}

fn print_outcome(request: &DiffRequest, outcome: &DiffOutcome) {
    let result = &outcome.result;
    println!(
        "{} {} {} → {} (key: {})",
        "Diff".blue().bold(),
        request.service.display_name(),
        skytally_core::format_date(request.source),
        skytally_core::format_date(request.target),
        result.key.columns().join(" + ")
    );

    print_keys("  + added:  ".green(), &result.added.iter().collect::<Vec<_>>());
    print_keys("  - removed:".red(), &result.removed.iter().collect::<Vec<_>>());
    println!("  = common:  {}", result.common.len());

    if request.mode == CompareMode::Fields {
        println!("  ~ changed: {}", result.changed.len());
        for (key, columns) in result.changed.iter().take(LIST_LIMIT) {
            println!("    {} ({})", key, columns.join(", "));
        }
    }

    for warning in &result.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }

    match &outcome.highlight {
        Some(plan) => println!(
            "{} {} added rows, {} removed rows appended",
            "Highlighted".green().bold(),
            plan.added_rows(),
            plan.removed_rows()
        ),
        None if !result.has_changes() => println!("{}", "No changes".green()),
        None => {}
    }
}
