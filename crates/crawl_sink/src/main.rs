mod cli;
mod feed;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crawl_output::{OutputWriter, StandardWriter};
use sink_logging::sink_info;

use crate::cli::Cli;
use crate::feed::{FetchSettings, ResponseFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    sink_logging::initialize(&cli.log_destination(), cli.log_level)
        .context("could not initialize logging")?;

    let options = cli.options();
    let writer: Arc<dyn OutputWriter> =
        Arc::new(StandardWriter::with_stdout(&options).context("invalid output configuration")?);

    let fetcher = if cli.store_response {
        let settings = FetchSettings {
            request_timeout: Duration::from_secs(cli.timeout),
            ..FetchSettings::default()
        };
        Some(Arc::new(
            ResponseFetcher::new(&settings).context("could not build http client")?,
        ))
    } else {
        None
    };

    let stats = feed::feed(
        io::BufReader::new(io::stdin()),
        Arc::clone(&writer),
        fetcher,
        usize::from(cli.concurrency),
    )
    .await;
    sink_info!(
        "processed {} results ({} skipped lines, {} failed writes)",
        stats.accepted,
        stats.skipped,
        stats.failed
    );

    writer.close().context("could not close output")?;
    Ok(())
}
