// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! asiril - run Siril commands from the shell over the pipe protocol.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use async_siril::config::SirilConfig;
use async_siril::session::SirilCli;

/// Drive a Siril session and run commands through its pipe interface.
#[derive(Parser)]
#[command(name = "asiril")]
#[command(author, version, about = "Typed pipe client for siril-cli", long_about = None)]
struct Cli {
    /// Commands to run, in order (raw Siril command lines)
    commands: Vec<String>,

    /// Path to the siril-cli executable
    #[arg(long, env = "ASIRIL_SIRIL")]
    siril: Option<PathBuf>,

    /// Working directory passed to Siril
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// JSON config file (flags override its values)
    #[arg(short, long, env = "ASIRIL_CONFIG")]
    config: Option<PathBuf>,

    /// Limit the number of processing threads
    #[arg(long)]
    cpu: Option<u32>,

    /// Limit memory to an absolute amount in GB
    #[arg(long, conflicts_with = "memory_ratio")]
    memory: Option<f64>,

    /// Limit memory to a ratio of free memory
    #[arg(long)]
    memory_ratio: Option<f64>,

    /// Derive CPU/memory limits from the current cgroup
    #[arg(long)]
    container: bool,

    /// Only print the Siril version and exit
    #[arg(long)]
    probe: bool,

    /// Show debug output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => SirilConfig::from_file(path).await?,
        None => SirilConfig::default(),
    };
    if cli.container {
        config.resources = async_siril::resources::SirilResource::container_aware_limits();
    }
    if let Some(siril) = cli.siril {
        config.executable = Some(siril);
    }
    if let Some(directory) = cli.directory {
        config.working_directory = Some(directory);
    }
    if let Some(cpu) = cli.cpu {
        config.resources.cpu_limit = Some(cpu);
    }
    if let Some(memory) = cli.memory {
        config.resources.memory_limit_gb = Some(memory);
    }
    if let Some(ratio) = cli.memory_ratio {
        config.resources.memory_percent = ratio;
    }

    let mut session = SirilCli::new(config).await?;
    println!("{}", session.version());
    if cli.probe || cli.commands.is_empty() {
        return Ok(());
    }

    session.start().await?;
    let result = session
        .command_all(cli.commands.iter().map(String::as_str))
        .await;
    session.close().await?;
    result?;
    Ok(())
}
