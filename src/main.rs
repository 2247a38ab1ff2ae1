use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use planning_leads::{
    configuration::get_configuration,
    domain::portal::CouncilProfile,
    services::{DroidBay, LeadScanner, ProviderProbe, SnapshotDir},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let councils = configuration
        .councils
        .iter()
        .map(|c| {
            c.profile()
                .with_context(|| format!("Invalid base url for council {}", c.id))
        })
        .collect::<anyhow::Result<Vec<CouncilProfile>>>()?;

    // Nothing is served until the browser provider answers its status check
    let ready = ProviderProbe::new(&configuration.browser.webdriver_url)
        .check()
        .await?;
    let browser = DroidBay::new(&configuration.browser);

    let mut scanner = LeadScanner::new(browser, configuration.scan.clone(), councils, ready);
    if let Some(dir) = &configuration.scan.diagnostics_dir {
        log::info!("Writing failure snapshots to {}", dir);
        scanner = scanner.with_diagnostics(Box::new(SnapshotDir::new(dir)));
    }

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!(
        "Serving {} councils on {}",
        scanner.councils().len(),
        address
    );

    run(listener, scanner)?.await?;
    Ok(())
}
