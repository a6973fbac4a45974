//! Job journal
//!
//! Append-only log of job attempts, one JSON object per line:
//!
//! ```text
//! {"run_id":"…","job_name":"CreateDirectories","status":"done","start_time":"…","end_time":"…","error":null}
//! ```
//!
//! Resume only trusts the last status seen for each job name.

use netcutter_core::domain::job::{JobRecord, JobStatus};
use netcutter_core::error::Result;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Repository trait for the job attempt journal
pub trait JournalStore: Send + Sync {
    /// Appends one finished record
    ///
    /// The record must be durable when this returns.
    fn append(&self, record: &JobRecord) -> Result<()>;

    /// Reads every readable record in append order
    fn read_records(&self) -> Result<Vec<JobRecord>>;

    /// Names of the jobs whose most recent attempt is `done`
    fn done_job_names(&self) -> Result<HashSet<String>> {
        let records = self.read_records()?;
        Ok(latest_statuses(&records)
            .into_iter()
            .filter(|(_, status)| *status == JobStatus::Done)
            .map(|(name, _)| name)
            .collect())
    }
}

/// Collapses records to the last status seen per job name
pub fn latest_statuses<'a, I>(records: I) -> HashMap<String, JobStatus>
where
    I: IntoIterator<Item = &'a JobRecord>,
{
    let mut latest = HashMap::new();
    for record in records {
        latest.insert(record.job_name().to_string(), record.status());
    }
    latest
}

/// File implementation of JournalStore
///
/// The file is opened, appended to and closed for every record; there is no
/// long-held handle or lock.
#[derive(Debug, Clone)]
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    /// Creates a journal stored at `path`
    ///
    /// Nothing is created on disk until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalStore for FileJournal {
    fn append(&self, record: &JobRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = serde_json::to_string(record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A torn previous write must not swallow this record
        if ends_mid_line(&mut file)? {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", line)?;
        file.flush()?;
        file.sync_all()?;

        debug!(
            "Journaled {} ({}) to {}",
            record.job_name(),
            record.status(),
            self.path.display()
        );
        Ok(())
    }

    fn read_records(&self) -> Result<Vec<JobRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No journal at {}, starting fresh", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        // Raw bytes: a torn write may end inside a multibyte character
        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line?;
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<JobRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping unreadable journal line {} in {}: {}",
                    idx + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        Ok(records)
    }
}

fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// In-memory implementation of JournalStore
///
/// Clones share the same underlying records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJournal {
    records: Arc<Mutex<Vec<JobRecord>>>,
}

impl InMemoryJournal {
    /// Creates an empty in-memory journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a journal pre-filled with `records`
    pub fn with_records(records: Vec<JobRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Snapshot of the records appended so far
    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl JournalStore for InMemoryJournal {
    fn append(&self, record: &JobRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn read_records(&self) -> Result<Vec<JobRecord>> {
        Ok(self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn done(name: &str) -> JobRecord {
        let mut record = JobRecord::begin(Uuid::new_v4(), name, Utc::now());
        record.mark_done(Utc::now()).unwrap();
        record
    }

    fn failed(name: &str) -> JobRecord {
        let mut record = JobRecord::begin(Uuid::new_v4(), name, Utc::now());
        record.mark_error("boom", Utc::now()).unwrap();
        record
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let journal = FileJournal::new(dir.path().join("netcutter.log"));

        assert!(journal.read_records().unwrap().is_empty());
        assert!(journal.done_job_names().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let journal = FileJournal::new(dir.path().join("logs").join("netcutter.log"));

        journal.append(&done("CreateDirectories")).unwrap();
        journal.append(&failed("BuildGraph")).unwrap();

        let records = journal.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].job_name(), "CreateDirectories");
        assert_eq!(records[0].status(), JobStatus::Done);
        assert_eq!(records[1].job_name(), "BuildGraph");
        assert_eq!(records[1].status(), JobStatus::Error);
        assert_eq!(records[1].error(), Some("boom"));
    }

    #[test]
    fn test_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netcutter.log");
        let journal = FileJournal::new(&path);

        journal.append(&done("A")).unwrap();
        journal.append(&done("B")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"run_id\":"));
        assert!(lines[0].contains("\"job_name\":\"A\",\"status\":\"done\""));
    }

    #[test]
    fn test_last_status_wins() {
        let journal = InMemoryJournal::with_records(vec![
            done("A"),
            done("B"),
            failed("A"),
            failed("C"),
            done("C"),
        ]);

        let done_names = journal.done_job_names().unwrap();
        assert!(!done_names.contains("A"));
        assert!(done_names.contains("B"));
        assert!(done_names.contains("C"));
        assert_eq!(done_names.len(), 2);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netcutter.log");
        let journal = FileJournal::new(&path);

        journal.append(&done("A")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file).unwrap();
            write!(file, "{{\"run_id\":\"00000000-0000").unwrap();
        }

        let records = journal.read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(journal.done_job_names().unwrap().contains("A"));
    }

    #[test]
    fn test_torn_multibyte_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netcutter.log");
        let journal = FileJournal::new(&path);

        journal.append(&done("A")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"job_name\":\"B\",\"error\":\"caf\xC3").unwrap();
        }

        let records = journal.read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_name(), "A");

        journal.append(&done("B")).unwrap();
        let done = journal.done_job_names().unwrap();
        assert!(done.contains("A") && done.contains("B"));
    }

    #[test]
    fn test_append_after_torn_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netcutter.log");
        fs::write(&path, "{\"run_id\":\"0000").unwrap();

        let journal = FileJournal::new(&path);
        journal.append(&done("A")).unwrap();

        let records = journal.read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_name(), "A");
    }

    #[test]
    fn test_in_memory_clones_share_records() {
        let journal = InMemoryJournal::new();
        let handle = journal.clone();

        journal.append(&done("A")).unwrap();
        assert_eq!(handle.records().len(), 1);
    }
}
