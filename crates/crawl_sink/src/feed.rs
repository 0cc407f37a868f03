//! Drives the output writer from concurrent tasks, one per input line.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crawl_output::{capture_response, CrawlResult, OutputWriter, RawResponse};
use reqwest::Method;
use sink_logging::{sink_debug, sink_error, sink_warn};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{self, JoinSet};

// Input lines buffered ahead of the tasks that consume them.
const READ_AHEAD: usize = 256;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Re-issues the request behind a result so its raw response can be archived.
#[derive(Debug, Clone)]
pub struct ResponseFetcher {
    client: reqwest::Client,
}

impl ResponseFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, result: &CrawlResult) -> Result<RawResponse, reqwest::Error> {
        let method = request_method(&result.method);
        let mut request = self.client.request(method, result.url.as_str());
        if !result.body.is_empty() {
            request = request.body(result.body.clone());
        }
        capture_response(request.send().await?).await
    }
}

fn request_method(name: &str) -> Method {
    if name.is_empty() {
        return Method::GET;
    }
    Method::from_bytes(name.to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub accepted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<CrawlResult>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Read lines on a dedicated thread so blocking input never stalls the runtime.
fn spawn_reader<R>(input: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(READ_AHEAD);
    thread::spawn(move || {
        for line in input.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn feed<R>(
    input: R,
    writer: Arc<dyn OutputWriter>,
    fetcher: Option<Arc<ResponseFetcher>>,
    concurrency: usize,
) -> FeedStats
where
    R: BufRead + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut lines = spawn_reader(input);
    let mut tasks = JoinSet::new();
    let mut stats = FeedStats::default();
    let mut number = 0usize;

    while let Some(line) = lines.recv().await {
        number += 1;
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                sink_error!("stopped reading input at line {number}: {err}");
                break;
            }
        };
        let result = match parse_line(&line) {
            Ok(Some(result)) => result,
            Ok(None) => continue,
            Err(err) => {
                sink_warn!("skipping line {number}: {err}");
                stats.skipped += 1;
                continue;
            }
        };
        stats.accepted += 1;

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let writer = Arc::clone(&writer);
        let fetcher = fetcher.clone();
        tasks.spawn(async move {
            let _permit = permit;
            process(writer, fetcher.as_deref(), result).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => {}
            Ok(false) => stats.failed += 1,
            Err(err) => {
                sink_error!("result task aborted: {err}");
                stats.failed += 1;
            }
        }
    }
    stats
}

async fn process(
    writer: Arc<dyn OutputWriter>,
    fetcher: Option<&ResponseFetcher>,
    result: CrawlResult,
) -> bool {
    let response = match fetcher {
        Some(fetcher) if !result.url.is_empty() => match fetcher.fetch(&result).await {
            Ok(response) => Some(response),
            Err(err) => {
                sink_warn!("could not fetch {}: {err}", result.url);
                None
            }
        },
        _ => None,
    };

    // The writer locks and does file I/O, so it runs off the async workers.
    let written = task::spawn_blocking(move || {
        writer
            .write(Some(&result), response.as_ref())
            .map(|()| result.url)
    })
    .await;

    match written {
        Ok(Ok(url)) => {
            sink_debug!("wrote result for {url}");
            true
        }
        Ok(Err(err)) => {
            sink_error!("{err}");
            false
        }
        Err(err) => {
            sink_error!("write task aborted: {err}");
            false
        }
    }
}
