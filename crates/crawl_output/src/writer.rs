use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crawl_model::{validate_field_names, CrawlResult, FieldError, RawResponse};
use serde::Deserialize;
use sink_logging::{sink_info, sink_trace};
use thiserror::Error;

use crate::archive::{ArchiveError, ResponseArchiver, DEFAULT_RESPONSE_DIR};
use crate::color::decolorize;
use crate::console::{ConsoleSink, StdoutConsole};
use crate::encode::{EncodeError, Encoder, OutputMode};
use crate::field_store::{FieldStore, DEFAULT_STORE_FIELDS_DIR};
use crate::persist::{FileSink, OpenMode, SinkError};

/// Writer configuration, validated once by [`StandardWriter::new`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Decorate console text output. File output is never colored.
    pub colors: bool,
    /// Emit JSON objects instead of text lines.
    pub json: bool,
    /// Include timestamp and body in the default text line.
    pub verbose: bool,
    /// Also append every emitted event to this file.
    pub output_file: Option<PathBuf>,
    /// Keep existing content of `output_file` instead of truncating it.
    pub append_output: bool,
    /// Restrict output to these fields (comma/whitespace separated).
    pub fields: Option<String>,
    /// Store these fields in per-field files.
    pub store_fields: Option<String>,
    /// Directory for per-field files; defaults to [`DEFAULT_STORE_FIELDS_DIR`].
    pub store_fields_dir: Option<PathBuf>,
    /// Archive raw responses.
    pub store_response: bool,
    /// Archive directory; defaults to [`DEFAULT_RESPONSE_DIR`].
    pub store_response_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not validate fields: {0}")]
    InvalidFields(#[source] FieldError),
    #[error("could not validate store fields: {0}")]
    InvalidStoreFields(#[source] FieldError),
    #[error("could not create output file: {0}")]
    OutputFile(#[source] SinkError),
    #[error("could not create response archive: {0}")]
    ResponseArchive(#[source] ArchiveError),
}

/// Failure of one `write` or `close`, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not store fields: {0}")]
    StoreFields(#[source] SinkError),
    #[error("could not format output: {0}")]
    Format(#[from] EncodeError),
    #[error("could not write to output: {0}")]
    Output(#[source] SinkError),
    #[error("could not store response: {0}")]
    Archive(#[from] ArchiveError),
    #[error("writer is already closed")]
    Closed,
}

/// Destination for crawl events, shared by all producers.
pub trait OutputWriter: Send + Sync {
    /// Emit `result` to screen and file, and archive `response`. Either may be absent.
    fn write(
        &self,
        result: Option<&CrawlResult>,
        response: Option<&RawResponse>,
    ) -> Result<(), WriteError>;

    /// Flush and release all files. Later writes fail with [`WriteError::Closed`];
    /// a second close may fail.
    fn close(&self) -> Result<(), WriteError>;
}

/// Console + file writer with optional field storage and response archive.
///
/// All result emission (field storage, encoding, console and file output)
/// happens under one lock, so lines from concurrent producers never
/// interleave. Response archival runs outside that lock. Once closed, every
/// write is refused before it touches any file.
pub struct StandardWriter {
    encoder: Encoder,
    console: Arc<dyn ConsoleSink>,
    // Set only while `output` is locked.
    closed: AtomicBool,
    output: Mutex<Option<FileSink>>,
    field_store: Option<FieldStore>,
    archiver: Option<ResponseArchiver>,
}

impl StandardWriter {
    pub fn new(options: &Options, console: Arc<dyn ConsoleSink>) -> Result<Self, ConfigError> {
        let fields = match options.fields.as_deref() {
            Some(list) => validate_field_names(list).map_err(ConfigError::InvalidFields)?,
            None => Vec::new(),
        };
        let store_fields = match options.store_fields.as_deref() {
            Some(list) => validate_field_names(list).map_err(ConfigError::InvalidStoreFields)?,
            None => Vec::new(),
        };

        let mode = if options.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let encoder = Encoder::new(mode, options.colors, options.verbose, fields);

        let field_store = (!store_fields.is_empty()).then(|| {
            let dir = options
                .store_fields_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FIELDS_DIR));
            FieldStore::new(dir, store_fields)
        });

        let output = match &options.output_file {
            Some(path) => {
                let mode = if options.append_output {
                    OpenMode::Append
                } else {
                    OpenMode::Truncate
                };
                Some(FileSink::open(path, mode).map_err(ConfigError::OutputFile)?)
            }
            None => None,
        };

        let archiver = if options.store_response {
            let dir = options
                .store_response_dir
                .clone()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESPONSE_DIR));
            Some(ResponseArchiver::new(dir).map_err(ConfigError::ResponseArchive)?)
        } else {
            None
        };

        sink_info!(
            "output writer ready: mode={:?} colors={} verbose={} file={:?} store_fields={:?}",
            mode,
            options.colors,
            options.verbose,
            output.as_ref().map(|sink: &FileSink| sink.path().to_path_buf()),
            field_store.as_ref().map(|store| store.fields().to_vec()),
        );

        Ok(Self {
            encoder,
            console,
            closed: AtomicBool::new(false),
            output: Mutex::new(output),
            field_store,
            archiver,
        })
    }

    /// Writer that prints to stdout.
    pub fn with_stdout(options: &Options) -> Result<Self, ConfigError> {
        Self::new(options, Arc::new(StdoutConsole))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn archiver(&self) -> Option<&ResponseArchiver> {
        self.archiver.as_ref()
    }

    pub fn field_store(&self) -> Option<&FieldStore> {
        self.field_store.as_ref()
    }

    fn write_result(&self, result: &CrawlResult) -> Result<(), WriteError> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(WriteError::Closed);
        }

        if let Some(store) = &self.field_store {
            store.store(result).map_err(WriteError::StoreFields)?;
        }

        let data = self.encoder.encode(result)?;
        if data.is_empty() {
            sink_trace!("suppressed empty result for {:?}", result.url);
            return Ok(());
        }

        self.console.emit(&data);

        if let Some(sink) = output.as_mut() {
            let persisted = match self.encoder.mode() {
                OutputMode::Text => decolorize(&data),
                OutputMode::Json => Cow::Borrowed(data.as_slice()),
            };
            sink.write_line(&persisted).map_err(WriteError::Output)?;
        }
        sink_trace!("emitted {} bytes for {:?}", data.len(), result.url);
        Ok(())
    }
}

impl fmt::Debug for StandardWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardWriter")
            .field("encoder", &self.encoder)
            .field("closed", &self.closed)
            .field("output", &self.output)
            .field("field_store", &self.field_store)
            .field("archiver", &self.archiver)
            .finish_non_exhaustive()
    }
}

impl OutputWriter for StandardWriter {
    fn write(
        &self,
        result: Option<&CrawlResult>,
        response: Option<&RawResponse>,
    ) -> Result<(), WriteError> {
        if self.is_closed() {
            return Err(WriteError::Closed);
        }

        let emitted = match result {
            Some(result) => self.write_result(result),
            None => Ok(()),
        };

        // Archival is attempted even if emission failed; the first error wins.
        let archived = match (&self.archiver, response) {
            (Some(archiver), Some(response)) => archiver
                .archive(response)
                .map(|_| ())
                .map_err(WriteError::from),
            _ => Ok(()),
        };

        emitted.and(archived)
    }

    fn close(&self) -> Result<(), WriteError> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::Release);

        let released = match output.as_mut() {
            Some(sink) => sink.close().map_err(WriteError::Output),
            None => Ok(()),
        };
        let stored = match &self.field_store {
            Some(store) => store.close().map_err(WriteError::StoreFields),
            None => Ok(()),
        };
        let archived = match &self.archiver {
            Some(archiver) => archiver.close().map_err(WriteError::Archive),
            None => Ok(()),
        };

        released.and(stored).and(archived)
    }
}
