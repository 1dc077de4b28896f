mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gatectl_core::Session;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Profile commands, offline validation, and policy registry lookups
        // never touch the gateway
        Command::Profile(args) => commands::profile::handle(args, &cli.global),

        Command::Config(cli::ConfigArgs {
            command: cli::ConfigCommand::Validate { file },
        }) => commands::config_doc::validate(&file, &cli.global),

        Command::Policies(args)
            if matches!(
                args.command,
                cli::PoliciesCommand::Kinds { .. } | cli::PoliciesCommand::Default { .. }
            ) =>
        {
            commands::policies::registry(args.command, &cli.global)
        }

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "gatectl", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a gateway session
        cmd => {
            let session_config = config::session_config(&cli.global)?;
            let url = session_config.url.to_string();
            let session = Session::new(session_config)?;

            // Ctrl-C aborts an edit between its network steps.
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            tracing::debug!(command = ?cmd, %url, "dispatching command");
            commands::dispatch(cmd, &session, &cancel, &cli.global)
                .await
                .map_err(|e| e.at_url(&url))
        }
    }
}
