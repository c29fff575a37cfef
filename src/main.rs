use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use port_status::config::{Config, LOG_FILE_NAME, data_dir};
use port_status::inventory::command::ShellCommandRunner;
use port_status::logging;
use port_status::report;
use port_status::scheduler::engine::{Scheduler, SchedulerOptions};
use port_status::scheduler::pipeline::{Pipeline, RunMode};
use port_status::version::registries::MacPortsRegistry;

#[derive(Parser)]
#[command(name = "port-status")]
#[command(version, about = "Reports whether installed MacPorts ports are up to date")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the ports API
    #[arg(long, global = true)]
    registry_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full check and print the result
    Check,
    /// Keep checking on a timer and whenever the MacPorts registry changes
    Watch {
        /// Refresh interval in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,

        /// Don't watch the registry directory
        #[arg(long)]
        no_watch: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.registry_url {
        config.registry.base_url = url;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command.unwrap_or(Command::Watch {
        interval_secs: None,
        no_watch: false,
    }) {
        Command::Check => {
            logging::init_stderr(config.log.json);
            runtime.block_on(check(config))
        }
        Command::Watch {
            interval_secs,
            no_watch,
        } => {
            if let Some(secs) = interval_secs {
                config.schedule.refresh_interval_ms = secs.saturating_mul(1000);
            }
            if no_watch {
                config.schedule.watch = false;
            }
            let _guard = logging::init_file(&data_dir(), LOG_FILE_NAME, config.log.json)?;
            runtime.block_on(watch(config))
        }
    }
}

fn build_pipeline(config: &Config) -> Arc<Pipeline> {
    let runner = Arc::new(ShellCommandRunner::from_config(&config.commands));
    let registry = Arc::new(MacPortsRegistry::with_timeout(
        &config.registry.base_url,
        config.registry.request_timeout(),
    ));
    Arc::new(Pipeline::from_config(config, runner, registry))
}

async fn check(config: Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config);
    let result = pipeline.run(RunMode::Full).await?;
    print!("{}", report::render(&result, false));
    Ok(())
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let scheduler = Scheduler::start(
        build_pipeline(&config),
        SchedulerOptions::from_config(&config.schedule),
    );
    let handle = scheduler.handle();
    let mut view = scheduler.view();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Type `r` and press enter to reload, ctrl-c to quit");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("received ctrl-c, shutting down");
                break;
            }
            changed = view.changed() => {
                if !changed {
                    break;
                }
                view.mark_seen();
                println!("{}", report::render(&view.snapshot(), view.loading()));
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim() == "r" => handle.reload(),
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    scheduler.shutdown().await;
    Ok(())
}
