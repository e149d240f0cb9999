use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use ses_template_sync::{
    config::{ActionInputs, StaticInputs},
    sync::{self, SyncError},
    template_sync::{template_store::SesTemplateStore, Reconciliation},
    workflow,
};
use tracing_subscriber::fmt::format::FmtSpan;

/// Creates or updates an AWS SES email template from local files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file with the action inputs, for running outside GitHub Actions.
    /// AWS keys may be left out to use the local AWS profile.
    #[arg(long, env = "SES_TEMPLATE_SYNC_INPUTS_FILE")]
    inputs_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    let is_json_log = std::env::var("LOG_FORMAT").map_or(false, |val| val.eq("json"));

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    if is_json_log {
        tracing_builder.json().init();
    } else {
        tracing_builder.init();
    }

    let args = Args::parse();

    if let Err(err) = sync_template(args).await {
        tracing::error!(message = "template sync failed", error = ?err);
        workflow::set_failed(&err.to_string());
        return Err(err.into());
    }

    Ok(())
}

async fn sync_template(args: Args) -> Result<Reconciliation, SyncError> {
    match args.inputs_file {
        Some(path) => {
            let inputs = StaticInputs::from_json_file(&path)?;
            sync::run(&inputs, SesTemplateStore::connect).await
        }
        None => sync::run(&ActionInputs, SesTemplateStore::connect).await,
    }
}
