//! Crawl output: encoding, persistence and response archival for crawl results.
mod archive;
mod capture;
mod color;
mod console;
mod encode;
mod field_store;
mod filename;
mod persist;
mod writer;

pub use archive::{ArchiveError, IndexEntry, ResponseArchiver, DEFAULT_RESPONSE_DIR, INDEX_FILENAME};
pub use capture::capture_response;
pub use color::{decolorize, Colorizer};
pub use console::{ConsoleSink, StdoutConsole};
pub use encode::{EncodeError, Encoder, OutputMode};
pub use field_store::{FieldStore, DEFAULT_STORE_FIELDS_DIR};
pub use filename::response_filename;
pub use persist::{ensure_output_dir, FileSink, OpenMode, SinkError, StagedFile};
pub use writer::{ConfigError, Options, OutputWriter, StandardWriter, WriteError};

pub use crawl_model::{validate_field_names, CrawlResult, Field, FieldError, RawResponse};
