use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crawl_model::{CrawlResult, Field};
use sink_logging::sink_debug;

use crate::encode::escape_value;
use crate::persist::{ensure_output_dir, FileSink, OpenMode, SinkError};

pub const DEFAULT_STORE_FIELDS_DIR: &str = "crawl_output";

/// Appends selected result fields to one newline-delimited file per field.
///
/// Files live at `{dir}/{field}.txt`. The directory and each file are
/// created on first use; open sinks are kept until [`FieldStore::close`],
/// after which every store fails with [`SinkError::Closed`].
#[derive(Debug)]
pub struct FieldStore {
    dir: PathBuf,
    fields: Vec<Field>,
    sinks: Mutex<Option<HashMap<Field, FileSink>>>,
}

impl FieldStore {
    pub fn new(dir: impl Into<PathBuf>, fields: Vec<Field>) -> Self {
        Self {
            dir: dir.into(),
            fields,
            sinks: Mutex::new(Some(HashMap::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn path_for(&self, field: Field) -> PathBuf {
        self.dir.join(format!("{}.txt", field.file_stem()))
    }

    /// Append the value of every configured field; unset fields store an empty line.
    pub fn store(&self, result: &CrawlResult) -> Result<(), SinkError> {
        let mut guard = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        let sinks = guard.as_mut().ok_or_else(|| SinkError::Closed {
            path: self.dir.clone(),
        })?;
        for &field in &self.fields {
            let sink = match sinks.entry(field) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    ensure_output_dir(&self.dir)?;
                    let path = self.path_for(field);
                    sink_debug!("opening field store {}", path.display());
                    entry.insert(FileSink::open(path, OpenMode::Append)?)
                }
            };
            let value = result.field_value(field);
            sink.write_line(escape_value(&value).as_bytes())?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Close every open field file. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), SinkError> {
        let Some(sinks) = self
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Ok(());
        };
        let mut first_error = None;
        for (_, mut sink) in sinks {
            if let Err(err) = sink.close() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
