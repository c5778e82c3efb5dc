mod cli;
mod config;
mod model;
mod providers;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::HookConfig;
use model::envelope::ResultEnvelope;
use model::work_item::WorkItem;
use providers::redmine::{self, RedmineClient};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match cli::parse_args(std::env::args().skip(1)) {
        cli::Invocation::Help => {
            cli::print_help();
            return ExitCode::SUCCESS;
        }
        cli::Invocation::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        cli::Invocation::Unknown(arg) => {
            eprintln!("Unknown option: {arg}");
            eprintln!("USAGE:");
            eprintln!("  redmine-hook              Run the hook");
            eprintln!("  redmine-hook --help       Show full usage");
            eprintln!("  redmine-hook --version    Print the version");
            return ExitCode::from(2);
        }
        cli::Invocation::Run => {}
    }

    let config = HookConfig::from_env();
    let envelope = run_hook(&config).await;
    emit(&envelope);

    // Failures are reported through the envelope's `ok` flag; the hook
    // runner parses stdout, not the exit status.
    ExitCode::SUCCESS
}

/// Run the whole pipeline and fold the outcome into the envelope shape the
/// dashboard expects, success or failure.
pub(crate) async fn run_hook(config: &HookConfig) -> ResultEnvelope {
    match run(config).await {
        Ok(items) => ResultEnvelope::success(items),
        Err(err) => {
            warn!("hook run failed: {err:#}");
            ResultEnvelope::failure(format!("{err:#}"))
        }
    }
}

/// Fetch, filter, and normalize: the open work items, or the first failure
/// anywhere in the pipeline.
async fn run(config: &HookConfig) -> Result<Vec<WorkItem>> {
    let client = RedmineClient::new(config).context("configuring Redmine client")?;
    let issues = client
        .fetch_all_issues()
        .await
        .context("fetching Redmine issues")?;

    let items = redmine::open_work_items(client.base_url(), &issues, &config.closed_status_names);
    debug!(fetched = issues.len(), open = items.len(), "normalized issues");
    Ok(items)
}

/// Write the envelope to stdout as one JSON document with no trailing
/// newline. This is the only stdout write a hook run performs.
fn emit(envelope: &ResultEnvelope) {
    match serde_json::to_string(envelope) {
        Ok(doc) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = stdout.write_all(doc.as_bytes()).and_then(|()| stdout.flush()) {
                warn!("failed to write envelope: {err}");
            }
        }
        Err(err) => warn!("failed to serialize envelope: {err}"),
    }
}

fn init_tracing() {
    // stderr only: stdout is reserved for the envelope.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
