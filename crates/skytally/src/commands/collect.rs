use crate::CollectArgs;
use crate::progress::CollectProgress;
use colored::Colorize;
use skytally_cloud::{Aggregator, AggregatorOptions, RunSummary, WorkPlan};
use skytally_cloud_aws::{AwsCollectors, AwsSessionFactory, default_regions};
use skytally_config::InventoryConfig;
use skytally_sheets::{
    GoogleSheetsBackend, GoogleSheetsConfig, MemoryBackend, PublishReport, Publisher,
    SheetsBackend,
};
use std::sync::Arc;

pub async fn handle(mut config: InventoryConfig, args: CollectArgs) -> anyhow::Result<()> {
    if let Some(services) = args.services {
        config.services = services;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.dry_run {
        config.validate_collection()?;
    } else {
        config.validate()?;
    }

    let mut selection = config.to_selection(default_regions);
    selection.account_filter = args.accounts;
    let plan = WorkPlan::build(&selection)?;

    // 収集前に出力先の認証情報を確認する
    let sheets = match config.spreadsheet_id() {
        Some(id) if !args.dry_run => {
            let sheets_config = GoogleSheetsConfig::from_env(id)?;
            Some(GoogleSheetsBackend::new(sheets_config)?)
        }
        _ => None,
    };

    println!(
        "{} {} units ({} services)",
        "Collecting".blue().bold(),
        plan.units().len(),
        plan.services().len()
    );

    let summary = collect(&config, &plan).await;
    print_summary(&summary);

    if summary.is_total_failure() {
        anyhow::bail!("every selected service failed; nothing to publish");
    }

    let report = match sheets {
        Some(backend) => publish(Publisher::new(backend), &summary, false).await,
        None => publish(Publisher::new(MemoryBackend::new("dry-run")), &summary, true).await,
    };

    check_published(&report)
}

/// Tables that failed to publish are reported; the run fails only when none
/// of them could be written.
fn check_published(report: &PublishReport) -> anyhow::Result<()> {
    if report.nothing_published() {
        anyhow::bail!(
            "none of the {} table(s) could be published",
            report.failed.len()
        );
    }
    Ok(())
}

async fn collect(config: &InventoryConfig, plan: &WorkPlan) -> RunSummary {
    let factory =
        AwsSessionFactory::from_env(&config.default_region, config.session_name.clone()).await;
    let options = AggregatorOptions::new(chrono::Local::now().date_naive())
        .with_concurrency(config.concurrency)
        .with_unit_timeout(config.unit_timeout());
    let aggregator = Aggregator::new(Arc::new(factory), Arc::new(AwsCollectors::new()), options);

    let progress = CollectProgress::new(plan.units().len());
    let summary = aggregator.run_with_progress(plan, &progress).await;
    progress.finish();
    summary
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Services:".bold());
    for outcome in &summary.services {
        let service = outcome.service();
        if outcome.is_flagged() {
            println!(
                "  {} {}: every unit failed ({} units), not published",
                "✗".red(),
                service.display_name().red(),
                outcome.units_total
            );
        } else {
            let status = if outcome.units_failed > 0 { "!".yellow() } else { "✓".green() };
            println!(
                "  {} {}: {} records ({}/{} units)",
                status,
                service.display_name().cyan(),
                outcome.table.len(),
                outcome.units_total - outcome.units_failed,
                outcome.units_total
            );
        }
    }

    println!("{}", "Accounts:".bold());
    for (account_id, account) in &summary.accounts {
        let failed = if account.failed > 0 {
            format!("{} failed", account.failed).red().to_string()
        } else {
            "0 failed".to_string()
        };
        println!(
            "  {} {} resources, {} units ok, {}",
            account_id.cyan(),
            account.resources,
            account.succeeded,
            failed
        );
    }

    if summary.has_failures() {
        println!("{}", "Failures:".bold());
        for failure in &summary.failures {
            println!(
                "  {} {} [{}] {}",
                "✗".red(),
                failure.unit,
                failure.error.kind(),
                failure.error
            );
        }
    }

    println!();
    println!("{} ({} ms)", summary, summary.duration_ms);
}

async fn publish<B: SheetsBackend>(
    publisher: Publisher<B>,
    summary: &RunSummary,
    dry_run: bool,
) -> PublishReport {
    let report = publisher.publish_all(summary.publishable()).await;

    println!();
    if dry_run {
        println!("{}", "Dry run, nothing was written:".yellow().bold());
        for sheet in &report.published {
            let columns = summary
                .services
                .iter()
                .find(|o| o.table.tab_name() == sheet.tab.title)
                .map(|o| o.table.columns().join(", "))
                .unwrap_or_default();
            println!(
                "  {} {} rows [{}]",
                sheet.tab.title.cyan(),
                sheet.rows_written,
                columns
            );
        }
    } else {
        println!("{} {}", "Published to".green().bold(), publisher.sheet_url());
        for sheet in &report.published {
            let verb = if sheet.replaced { "replaced" } else { "created" };
            println!(
                "  {} {} ({} rows, {}) {}",
                "✓".green(),
                sheet.tab.title.cyan(),
                sheet.rows_written,
                verb,
                sheet.url()
            );
        }
    }

    if !report.failed.is_empty() {
        eprintln!("{}", "Publish failures:".bold());
        for (service, error) in &report.failed {
            eprintln!("  {} {}: {}", "✗".red(), service.display_name(), error);
        }
    }
    report
}
