use colored::Colorize;
use skytally_cloud_aws::{
    AwsSessionFactory, CATALOGUE, DEFAULT_REGION, DEFAULT_SESSION_NAME, discover_regions,
    display_name,
};

pub async fn handle(discover: bool) -> anyhow::Result<()> {
    if !discover {
        println!("{}", "Region catalogue:".bold());
        for region in CATALOGUE {
            let workspaces = if region.virtual_desktop { "" } else { " (no WorkSpaces)" };
            println!(
                "  {} {}{}",
                format!("{:<16}", region.code).cyan(),
                region.display_name,
                workspaces.dimmed()
            );
        }
        return Ok(());
    }

    let home = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
    let factory = AwsSessionFactory::from_env(&home, DEFAULT_SESSION_NAME).await;
    let regions = discover_regions(factory.base_config()).await?;

    println!("{} ({})", "Enabled regions:".bold(), regions.len());
    for code in &regions {
        println!("  {} {}", format!("{:<16}", code).cyan(), display_name(code));
    }
    Ok(())
}
