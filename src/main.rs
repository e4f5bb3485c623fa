use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ntm::config::{Config, Settings};
use ntm::robot;
use ntm_core::api::RoutingCoreBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let core = match RoutingCoreBuilder::new()
        .routing(settings.routing.clone())
        .effectiveness(settings.effectiveness.clone())
        .activity(settings.activity.clone())
        .build()
    {
        Ok(core) => Arc::new(core),
        Err(e) => {
            let envelope = robot::error_envelope(robot::error_code(&e), &e.to_string());
            println!("{}", robot::render(&envelope, settings.output.pretty)?);
            std::process::exit(1);
        }
    };

    if !robot::run(core, cli.command, settings.output.pretty).await? {
        std::process::exit(1);
    }
    Ok(())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ntm=debug,ntm_core=debug")
    } else {
        EnvFilter::new("ntm=info,ntm_core=info")
    };

    // stdout carries JSON envelopes only
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
