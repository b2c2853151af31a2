mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use leasesync_config::LogSection;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Resolve config before tracing so the [log] section can seed the filter
    let settings = config::resolve(&cli.global);
    let log = settings
        .as_ref()
        .map(|s| s.config.log.clone())
        .unwrap_or_default();
    init_tracing(cli.global.verbose, &log);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, settings).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins, then `-v` levels, then `[log] level`. Output goes to
/// stderr so stdout stays clean for rendered data.
fn init_tracing(verbosity: u8, log: &LogSection) {
    let filter = match verbosity {
        0 => log.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if log.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, settings: Result<config::Settings, CliError>) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "leasesync", &mut std::io::stdout());
            Ok(())
        }

        // `config path` must work even when the file fails to parse
        Command::Config(args) => commands::config_cmd::handle(args, settings, &cli.global),

        cmd => {
            let settings = settings?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &settings, &cli.global).await
        }
    }
}
