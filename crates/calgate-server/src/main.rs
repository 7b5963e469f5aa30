//! calgate entry point.

use std::process::ExitCode;

use clap::Parser;

use calgate_core::init_tracing;
use calgate_server::cli::Cli;
use calgate_server::{Gateway, GatewayConfig, ServerResult, SignalHandler};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let mut config = GatewayConfig::load_from(&cli.config)?;

    if cli.validate {
        println!(
            "{}: configuration is valid ({} calendars)",
            cli.config.display(),
            config.calendars.len()
        );
        return Ok(());
    }

    if let Some(port) = cli.port {
        config.server = config.server.with_port(port);
    }

    let signals = SignalHandler::new();
    signals.spawn_listener();

    Gateway::new(config)?.run(signals.shutdown()).await
}
