mod bootstrap;
mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use taskboard_core::storage::local::JsonFileStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::commands::Outcome;
use crate::error::CliError;

/// Kanban board on the command line.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
struct Cli {
    /// Config file; defaults to taskboard/config.json in the platform config dir
    #[arg(long, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Run one command and exit, e.g. `taskboard mv "Fix bug" to Done`.
    /// Without one, commands are read from stdin.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);
    let data_file = config.data_file_path();
    log::info!(
        target: "taskboard.cli.startup",
        "Using data file {}",
        data_file.display()
    );

    let store = Arc::new(JsonFileStore::open(&data_file)?);
    let session = bootstrap::open_board(
        store,
        &config.board,
        &config.default_columns,
        &config.engine,
    )
    .await?;

    if !cli.command.is_empty() {
        if let Some(command) = commands::parse_tokens(&cli.command)? {
            if let Outcome::Continue(message) = commands::execute(&session, command).await? {
                println!("{}", message);
            }
        }
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let result = match commands::parse(&line) {
            Ok(Some(command)) => commands::execute(&session, command).await,
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        match result {
            Ok(Outcome::Continue(message)) => {
                stdout.write_all(message.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Ok(Outcome::Quit) => break,
            Err(e) => {
                log::debug!(target: "taskboard.cli.command", "{:?}", e);
                stdout
                    .write_all(format!("error: {}\n", e).as_bytes())
                    .await?;
            }
        }
    }
    Ok(())
}
