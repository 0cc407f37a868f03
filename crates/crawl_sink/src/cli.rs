use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use crawl_output::Options;
use log::LevelFilter;
use sink_logging::LogDestination;

/// Feed JSON-lines crawl results from stdin through the output writer.
#[derive(Parser, Debug)]
#[command(name = "crawl_sink", version, about)]
pub struct Cli {
    /// Write JSON objects instead of text lines
    #[arg(long)]
    pub json: bool,

    /// Disable colored console output
    #[arg(long)]
    pub no_color: bool,

    /// Include timestamp and body in text output
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of truncating it
    #[arg(long, requires = "output")]
    pub append: bool,

    /// Fields to show, e.g. "URL,Tag"
    #[arg(short, long)]
    pub fields: Option<String>,

    /// Fields to store in per-field files
    #[arg(long)]
    pub store_fields: Option<String>,

    /// Directory for per-field files
    #[arg(long)]
    pub store_fields_dir: Option<PathBuf>,

    /// Fetch each result URL and archive the raw response
    #[arg(long)]
    pub store_response: bool,

    /// Directory for archived responses (wiped on start)
    #[arg(long)]
    pub store_response_dir: Option<PathBuf>,

    /// Maximum results processed at once
    #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Request timeout in seconds when fetching responses
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Diagnostic log level (stderr)
    #[arg(long, default_value = "warn")]
    pub log_level: LevelFilter,

    /// Also write diagnostics to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            colors: !self.no_color && io::stdout().is_terminal(),
            json: self.json,
            verbose: self.verbose,
            output_file: self.output.clone(),
            append_output: self.append,
            fields: self.fields.clone(),
            store_fields: self.store_fields.clone(),
            store_fields_dir: self.store_fields_dir.clone(),
            store_response: self.store_response,
            store_response_dir: self.store_response_dir.clone(),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
