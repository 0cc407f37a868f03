use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("could not open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not close {path:?}: {source}")]
    Close { path: PathBuf, source: io::Error },
    #[error("sink for {path:?} is already closed")]
    Closed { path: PathBuf },
    #[error("could not move staged file into {path:?}: {source}")]
    Persist { path: PathBuf, source: io::Error },
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), SinkError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(SinkError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
    }
    // Writability check: a temp file must be creatable.
    NamedTempFile::new_in(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file, discarding previous content.
    Truncate,
    /// Create the file if missing, keep previous content.
    Append,
}

/// Writer bound to exactly one file for its whole life.
///
/// Every `write` is a single unbuffered `write_all`, so a payload either
/// reaches the OS as one piece or the call fails. After `close` all further
/// calls fail with [`SinkError::Closed`].
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Open `path`, creating missing parent directories.
    pub fn open(path: impl Into<PathBuf>, mode: OpenMode) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| SinkError::Open {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Truncate => {
                options.write(true).truncate(true);
            }
            OpenMode::Append => {
                options.append(true);
            }
        }
        let file = options
            .create(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn ensure_open(&self) -> Result<(), SinkError> {
        match self.file {
            Some(_) => Ok(()),
            None => Err(SinkError::Closed {
                path: self.path.clone(),
            }),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        let file = self.file.as_mut().ok_or_else(|| SinkError::Closed {
            path: self.path.clone(),
        })?;
        file.write_all(data).map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `data` followed by a newline as one payload.
    pub fn write_line(&mut self, data: &[u8]) -> Result<(), SinkError> {
        let mut line = Vec::with_capacity(data.len() + 1);
        line.extend_from_slice(data);
        line.push(b'\n');
        self.write(&line)
    }

    /// Flush to disk and release the file handle.
    pub fn close(&mut self) -> Result<(), SinkError> {
        let mut file = self.file.take().ok_or_else(|| SinkError::Closed {
            path: self.path.clone(),
        })?;
        file.flush()
            .and_then(|_| file.sync_all())
            .map_err(|source| SinkError::Close {
                path: self.path.clone(),
                source,
            })
    }
}

/// Complete content for `target`, held in a temp file in the same directory.
///
/// Nothing is visible at `target` until [`StagedFile::commit`] renames the
/// temp file over it, so concurrent writers of one path each leave either
/// their whole content or none. Dropping without commit discards the temp file.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl StagedFile {
    pub fn write(target: impl Into<PathBuf>, data: &[u8]) -> Result<Self, SinkError> {
        let target = target.into();
        let dir = match target.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let write_err = |source| SinkError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| SinkError::Open {
            path: target.clone(),
            source,
        })?;
        tmp.write_all(data).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.as_file_mut().sync_all().map_err(write_err)?;
        Ok(Self { target, tmp })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace `target` with the staged content.
    pub fn commit(self) -> Result<PathBuf, SinkError> {
        let Self { target, tmp } = self;
        tmp.persist(&target).map_err(|err| SinkError::Persist {
            path: target.clone(),
            source: err.error,
        })?;
        Ok(target)
    }
}
