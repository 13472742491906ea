use super::CliError;
use anyhow::Context;
use nuresp_core::common::{NurespConfig, load_config};
use serde::Serialize;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub(super) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second initialization in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn load_run_config(path: Option<&Path>) -> Result<NurespConfig, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            load_config(path).map_err(|error| CliError::Compute(error.into()))
        }
        None => Ok(NurespConfig::default()),
    }
}

pub(super) fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{}", rendered);
    Ok(())
}
