use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use symdoc::{commands, watch};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "symdoc",
    about = "Documentation for module:Symbol#member references in JS/TS projects"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Documentation for a symbol, member, or whole module
    Docs {
        /// Reference: module[:Symbol[.static|#instance]] or node:Global[.member]
        reference: String,
        /// Output JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Reference syntax, error codes, and current state
    Info {
        /// Output JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Resolved file and module format of a reference's module
    Locate {
        /// Reference whose module part is resolved
        reference: String,
        /// Output JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// List every source module with its export count
    Modules {
        /// Output JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Resolve a reference, then re-resolve on every change
    Watch {
        /// Reference to keep resolving
        reference: String,
        /// Output JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (result, json) = match &cli.command {
        Commands::Docs { json, reference } => (commands::docs(&cli.root, reference, *json), *json),
        Commands::Info { json } => {
            commands::info(&cli.root, *json);
            (Ok(()), *json)
        },
        Commands::Locate { json, reference } => {
            (commands::locate(&cli.root, reference, *json), *json)
        },
        Commands::Modules { json } => (commands::modules(&cli.root, *json), *json),
        Commands::Watch { json, reference } => {
            return watch::run(&cli.root, reference, *json).unwrap_or_else(|e| {
                commands::report_error(&e, *json);
                return ExitCode::FAILURE;
            });
        },
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::report_error(&e, json);
            ExitCode::FAILURE
        },
    };
}

/// Log to stderr; stdout carries only results.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    return;
}
