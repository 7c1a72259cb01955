//! formsync entry point.

use clap::Parser;
use formsync::cli::commands;
use formsync::cli::{Cli, Commands, OutputFormat};
use formsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.format == OutputFormat::Csv {
        formsync::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // The server logs at info by default; one-shot commands stay quiet
    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(cli.verbose, cli.quiet, serving);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool, serving: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match (verbose, serving) {
            (0, false) => EnvFilter::new("warn"),
            (0, true) | (1, _) => EnvFilter::new("info,tower_http=warn"),
            (2, _) => EnvFilter::new("debug,rusqlite=info,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if serving {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Init { force } => commands::init::execute(cli.db.as_ref(), *force, json),

        Commands::Serve { host, port } => commands::serve::execute(cli.db.as_ref(), host, *port),

        // Forms
        Commands::Form { no_sync, command } => commands::form::execute(
            command,
            cli.db.as_ref(),
            cli.actor.as_deref(),
            *no_sync,
            json,
        ),

        // Sync
        Commands::Sync { command } => commands::sync::execute(command, cli.db.as_ref(), json),
    }
}
