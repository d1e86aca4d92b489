//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{board, client};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "lanes")]
#[command(author, version, about = "Track clients in ranked swimlanes")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new lanes project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage clients
    #[command(subcommand)]
    Client(client::ClientCommands),

    /// Show all lanes side by side
    Board,

    /// Show the number of clients in each lane
    Status,

    /// Verify that every lane is densely ranked
    Check,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let (format, config_error) = match cli.format {
        Some(format) => (format, None),
        None => match Config::load() {
            Ok(config) => (config.global.default_format.into(), None),
            Err(err) => (OutputFormat::default(), Some(err)),
        },
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("lanes starting");
    if let Some(err) = config_error {
        output.verbose_ctx("config", &format!("Ignoring unreadable config: {:#}", err));
    }

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created database at: {}", project.db_path().display()),
            );
            output.success(&format!(
                "Initialized lanes project at {}",
                project.root().display()
            ));
        }

        Commands::Client(cmd) => client::run(cmd, &output)?,

        Commands::Board => board::show(&output)?,

        Commands::Status => status(&output)?,

        Commands::Check => board::check(&output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Prints lane sizes
fn status(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let counts = project.store()?.counts()?;

    let lanes: Vec<_> = crate::domain::ClientStatus::ALL
        .iter()
        .map(|status| (*status, counts.get(status).copied().unwrap_or(0)))
        .collect();

    if output.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = lanes
            .iter()
            .map(|(status, count)| (status.to_string(), serde_json::json!(count)))
            .collect();
        output.data(&map);
    } else {
        for (status, count) in &lanes {
            println!("{:<12} {}", status.as_str(), count);
        }
        println!("{:<12} {}", "total", lanes.iter().map(|(_, c)| c).sum::<usize>());
    }

    Ok(())
}
