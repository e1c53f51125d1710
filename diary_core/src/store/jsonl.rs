//! Append-only JSON lines engine.
//!
//! Each saved record is one line in the log file. Appends take an
//! exclusive lock, reads a shared one. Deleting rewrites the file through
//! a temp file that is renamed over the original.

use super::{blocking, LogBackend, RemoveReport};
use crate::types::{RecordKey, SavedRecord};
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name used when the log lives in a data directory
pub const FILE_NAME: &str = "exercise_log.jsonl";

/// JSONL-backed log with file locking
#[derive(Clone, Debug)]
pub struct JsonlBackend {
    path: PathBuf,
}

impl JsonlBackend {
    /// Create a backend for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a backend for the standard file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogBackend for JsonlBackend {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn open(&self) -> Result<()> {
        let path = self.path.clone();
        blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(())
        })
        .await
    }

    async fn load(&self) -> Result<Vec<SavedRecord>> {
        let path = self.path.clone();
        blocking(move || read_records(&path)).await
    }

    async fn append(&self, record: &SavedRecord) -> Result<()> {
        let path = self.path.clone();
        let line = serde_json::to_string(record)?;
        let key = record.key;
        blocking(move || append_line(&path, &line)).await?;
        tracing::debug!("Appended record {} to {:?}", key, self.path);
        Ok(())
    }

    async fn remove(&self, keys: &[RecordKey]) -> Result<RemoveReport> {
        let path = self.path.clone();
        let keys = keys.to_vec();
        blocking(move || rewrite_without(&path, &keys)).await
    }

    async fn flush(&self) -> Result<()> {
        let path = self.path.clone();
        blocking(move || {
            if path.exists() {
                File::open(&path)?.sync_all()?;
            }
            Ok(())
        })
        .await
    }
}

/// Parse the file contents into records
///
/// A final line without a trailing newline is a write that never
/// finished; it is skipped with a warning. Any other malformed line means
/// the file is corrupt.
fn parse_lines(contents: &str) -> Result<Vec<SavedRecord>> {
    let torn_tail = !contents.is_empty() && !contents.ends_with('\n');
    let lines: Vec<&str> = contents.split_terminator('\n').collect();
    let last = lines.len().saturating_sub(1);

    let mut records = Vec::with_capacity(lines.len());
    for (line_num, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SavedRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) if torn_tail && line_num == last => {
                tracing::warn!("Skipping incomplete final line {}: {}", line_num + 1, e);
            }
            Err(e) => {
                return Err(Error::StorageUnavailable(format!(
                    "corrupt log line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(records)
}

/// Read all records from a JSONL log file
pub fn read_records(path: &Path) -> Result<Vec<SavedRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let mut contents = String::new();
    let read = (&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let records = parse_lines(&contents)?;
    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Append one serialized record, repairing a torn tail first
fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;

    // Acquire exclusive lock
    file.lock_exclusive()?;
    let result = append_locked(&mut file, line);
    file.unlock()?;
    result
}

fn append_locked(file: &mut File, line: &str) -> Result<()> {
    let len = file.metadata()?.len();
    if len > 0 {
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.seek(SeekFrom::Start(0))?;
            let mut contents = Vec::with_capacity(len as usize);
            file.read_to_end(&mut contents)?;
            let keep = contents
                .iter()
                .rposition(|b| *b == b'\n')
                .map_or(0, |pos| pos + 1);

            // A complete record that only lost its newline is still listed
            // by readers, so it stays. Anything else is an unfinished write.
            if serde_json::from_slice::<SavedRecord>(&contents[keep..]).is_ok() {
                file.seek(SeekFrom::End(0))?;
                file.write_all(b"\n")?;
                tracing::warn!("Restored missing newline after final log line");
            } else {
                file.set_len(keep as u64)?;
                tracing::warn!("Truncated {} bytes of incomplete log line", len - keep as u64);
            }
        }
    }

    file.seek(SeekFrom::End(0))?;
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    file.write_all(&buf)?;
    file.flush()?;
    file.sync_data()?;
    Ok(())
}

/// Rewrite the log without `keys`
fn rewrite_without(path: &Path, keys: &[RecordKey]) -> Result<RemoveReport> {
    if !path.exists() {
        return Ok(RemoveReport {
            absent: keys.to_vec(),
            ..RemoveReport::default()
        });
    }

    let file = OpenOptions::new().read(true).write(true).open(path)?;
    file.lock_exclusive()?;
    let result = rewrite_locked(&file, path, keys);
    // The original inode is gone after a successful rename; unlocking it is
    // still fine.
    let _ = file.unlock();
    result
}

fn rewrite_locked(file: &File, path: &Path, keys: &[RecordKey]) -> Result<RemoveReport> {
    let mut contents = String::new();
    (&*file).read_to_string(&mut contents)?;
    let records = parse_lines(&contents)?;

    let wanted: HashSet<RecordKey> = keys.iter().copied().collect();
    let present: HashSet<RecordKey> = records
        .iter()
        .map(|r| r.key)
        .filter(|k| wanted.contains(k))
        .collect();

    let mut report = RemoveReport::default();
    for key in keys {
        if present.contains(key) {
            report.removed.push(*key);
        } else {
            report.absent.push(*key);
        }
    }
    if report.removed.is_empty() {
        return Ok(report);
    }

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "log path missing parent")
    })?;
    let mut temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file_mut());
        for record in records.iter().filter(|r| !present.contains(&r.key)) {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Rewrote {:?} without {} records", path, report.removed.len());
    Ok(report)
}
