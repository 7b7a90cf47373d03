//! Whole-file CSV tables
//!
//! Every table is read in full and written in full. Writes go through a
//! temporary file in the destination directory which is then renamed over
//! the original, so a reader never observes a half-written table.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::StoreError;

/// A row type with a fixed header line
pub trait TableRow: Serialize + DeserializeOwned {
    /// Column names, in field order
    const HEADERS: &'static [&'static str];
}

/// Read a whole table. An absent file is an empty table; any other failure is an error.
pub fn read_table<T: TableRow>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Table file absent, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    decode_table(file).map_err(|e| StoreError::csv(path, e))
}

/// Decode CSV rows keyed by header name
pub fn decode_table<T: TableRow, R: Read>(reader: R) -> Result<Vec<T>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Encode rows as CSV. The header line is written even for an empty table.
pub fn encode_table<T: TableRow>(rows: &[T]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// A fully written table waiting to be moved into place
#[derive(Debug)]
pub struct StagedTable {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl StagedTable {
    /// Atomically replace the destination file with the staged contents
    pub fn commit(self) -> Result<(), StoreError> {
        let dest = self.dest;
        self.temp
            .persist(&dest)
            .map_err(|e| StoreError::io(&dest, e.error))?;
        debug!(path = %dest.display(), "Table committed");
        Ok(())
    }
}

/// Write rows to a temporary sibling of `path` without touching `path` itself
pub fn stage_table<T: TableRow>(path: &Path, rows: &[T]) -> Result<StagedTable, StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let bytes = encode_table(rows).map_err(|e| StoreError::csv(path, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    temp.write_all(&bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| StoreError::io(temp.path(), e))?;

    Ok(StagedTable {
        temp,
        dest: path.to_path_buf(),
    })
}

/// Move staged tables into place in order
///
/// Staging is where almost all failures happen (encoding, disk space), and
/// it completes for every table before the first rename. A crash between
/// two renames still leaves the earlier table new and the later one old.
pub fn commit_all(staged: Vec<StagedTable>) -> Result<(), StoreError> {
    for table in staged {
        table.commit()?;
    }
    Ok(())
}

/// Identity of a file's current contents, used to detect external edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

/// Fingerprint of `path`, or `None` when the file does not exist
pub fn fingerprint(path: &Path) -> Result<Option<Fingerprint>, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(Fingerprint {
            modified: meta.modified().ok(),
            len: meta.len(),
        })),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
