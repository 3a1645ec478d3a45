use std::env;
use std::io;
use std::process::ExitCode;

use commission_split::csv::{read_events, write_agents, write_splits};
use commission_split::{Config, Ledger};
use tokio_stream::wrappers::ReceiverStream;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: commission-split <deals.csv> [--agents]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut path = None;
    let mut by_agent = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--agents" => by_agent = true,
            _ if path.is_none() && !arg.starts_with("--") => path = Some(arg),
            _ => {
                eprintln!("{USAGE}");
                return ExitCode::from(2);
            }
        }
    }
    let Some(path) = path else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let events = match read_events(path.clone(), config) {
        Ok(events) => events,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut ledger = Ledger::new();
    let (event_sender, event_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in events {
            match result {
                Ok(event) => {
                    if event_sender.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(event_receiver)).await;

    info!(
        deals = ledger.records().count(),
        commission = %ledger.commission_total(),
        office = %ledger.office_total(),
        "ledger complete"
    );

    let stdout = io::stdout();
    let written = if by_agent {
        let mut agents: Vec<_> = ledger.agents().collect();
        agents.sort_by_key(|a| a.agent);
        write_agents(stdout.lock(), agents)
    } else {
        let mut records: Vec<_> = ledger.records().collect();
        records.sort_by_key(|r| r.deal.tx);
        write_splits(stdout.lock(), records)
    };

    if let Err(e) = written {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
