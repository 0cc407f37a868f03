use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crawl_model::RawResponse;
use sink_logging::{sink_debug, sink_info, sink_warn};
use thiserror::Error;
use url::Url;

use crate::filename::response_filename;
use crate::persist::{FileSink, OpenMode, SinkError, StagedFile};

pub const DEFAULT_RESPONSE_DIR: &str = "crawl_responses";
pub const INDEX_FILENAME: &str = "index.txt";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("refusing to reset response directory {0:?}")]
    UnsafeDirectory(PathBuf),
    #[error("could not prepare response directory {path:?}: {source}")]
    Directory { path: PathBuf, source: io::Error },
    #[error("could not create index file: {0}")]
    CreateIndex(#[source] SinkError),
    #[error("response has no request url")]
    MissingUrl,
    #[error("invalid request url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("could not write response file: {0}")]
    Response(#[source] SinkError),
    #[error("could not update index: {0}")]
    Index(#[source] SinkError),
}

/// One line of the archive index: `{filename} {url} ({status})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub filename: String,
    pub url: String,
    pub status: String,
}

impl IndexEntry {
    pub fn to_line(&self) -> String {
        format!("{} {} ({})", self.filename, self.url, self.status)
    }

    /// Parse a line written by [`IndexEntry::to_line`].
    pub fn parse(line: &str) -> Option<Self> {
        let (filename, rest) = line.trim_end().split_once(' ')?;
        let (url, status) = rest.rsplit_once(" (")?;
        let status = status.strip_suffix(')')?;
        if filename.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            filename: filename.to_string(),
            url: url.to_string(),
            status: status.to_string(),
        })
    }
}

/// Stores raw responses as individual files plus an append-only index.
///
/// Construction wipes and re-creates the directory so one run never mixes
/// with files from a previous one. Response content is staged outside any
/// shared lock; moving it into place and appending the index line happen
/// together under the index lock.
#[derive(Debug)]
pub struct ResponseArchiver {
    root: PathBuf,
    index: Mutex<FileSink>,
}

impl ResponseArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        reset_dir(&root)?;
        let index = FileSink::open(root.join(INDEX_FILENAME), OpenMode::Truncate)
            .map_err(ArchiveError::CreateIndex)?;
        sink_info!("storing responses in {}", root.display());
        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILENAME)
    }

    /// Write `response` to its derived file and record it in the index.
    ///
    /// Returns the path of the response file.
    pub fn archive(&self, response: &RawResponse) -> Result<PathBuf, ArchiveError> {
        if response.request_url.is_empty() {
            return Err(ArchiveError::MissingUrl);
        }
        let url = Url::parse(&response.request_url).map_err(|source| ArchiveError::InvalidUrl {
            url: response.request_url.clone(),
            source,
        })?;

        let filename = response_filename(&url);
        let staged = StagedFile::write(self.root.join(&filename), &response.dump())
            .map_err(ArchiveError::Response)?;

        let entry = IndexEntry {
            filename,
            url: url.to_string(),
            status: response.status_text(),
        };
        let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed index accepts no files, so nothing is left unindexed.
        index.ensure_open().map_err(ArchiveError::Index)?;
        let path = staged.commit().map_err(ArchiveError::Response)?;
        if let Err(err) = index.write_line(entry.to_line().as_bytes()) {
            sink_warn!("{} is stored but missing from the index", path.display());
            return Err(ArchiveError::Index(err));
        }
        drop(index);

        sink_debug!("archived {} to {}", entry.url, path.display());
        Ok(path)
    }

    /// Flush and release the index file.
    pub fn close(&self) -> Result<(), ArchiveError> {
        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close()
            .map_err(ArchiveError::Index)
    }
}

fn reset_dir(root: &Path) -> Result<(), ArchiveError> {
    // Only wipe paths that name an actual directory entry ("", ".", "/" do not).
    if root.file_name().is_none() {
        return Err(ArchiveError::UnsafeDirectory(root.to_path_buf()));
    }
    match fs::remove_dir_all(root) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ArchiveError::Directory {
                path: root.to_path_buf(),
                source,
            })
        }
    }
    fs::create_dir_all(root).map_err(|source| ArchiveError::Directory {
        path: root.to_path_buf(),
        source,
    })
}
