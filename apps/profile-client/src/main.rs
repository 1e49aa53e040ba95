use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use profile_client::config::Config;
use profile_client::runner::{run_concurrent, run_sequential, sample_submissions, summarize};
use profile_client::{Attachment, ProfileClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing PROFILE_API_BASE_URL)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("profile_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting profile client v{}", env!("CARGO_PKG_VERSION"));

    let client = ProfileClient::from_config(&config).context("Invalid client configuration")?;
    info!("Submitting to {}", client.base_url());

    let attachment = match &config.attachment_path {
        Some(path) => {
            let attachment = Attachment::from_path(path).await?;
            info!(
                "Attaching {} ({} bytes, {})",
                attachment.filename,
                attachment.len(),
                attachment.mime
            );
            Some(attachment)
        }
        None => None,
    };

    let submissions = sample_submissions(
        attachment,
        Duration::from_secs(config.full_profile_timeout_secs),
    )?;

    let outcomes = if config.concurrent {
        run_concurrent(Arc::new(client), submissions).await
    } else {
        run_sequential(&client, submissions).await
    };

    for outcome in &outcomes {
        println!("{outcome}\n");
    }

    let summary = summarize(&outcomes);
    info!(
        "Done: {} succeeded, {} rejected by the API, {} transport failures, {} other errors",
        summary.succeeded, summary.rejected, summary.transport_failures, summary.other_errors
    );

    Ok(())
}
