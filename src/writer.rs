//! Publishing results
//!
//! A run writes into a staging directory next to the output location, and only moves it into
//! place once every file is complete. The last file written is an empty `_SUCCESS` marker, and
//! readers here refuse a directory without it. If a run fails (or the `StagedOutput` is
//! dropped without being published), the staging directory is deleted and whatever was at the
//! output location before is left alone.
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Summary, SummaryRow};
use crate::classify::{Label, SentimentResult};
use crate::errors::*;
use crate::record::Reject;

pub const RECORDS_FILE: &str = "records.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const REJECTS_FILE: &str = "rejects.csv";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

pub const RECORD_COLUMNS: [&str; 14] = [
    "row", "id", "author", "timestamp", "language", "country", "number_of_likes", "number_of_shares",
    "original_text", "cleaned_text", "token_count", "label", "score", "subjectivity",
];
pub const SUMMARY_COLUMNS: [&str; 3] = ["group_key", "count", "mean_score"];
pub const REJECT_COLUMNS: [&str; 3] = ["row", "id", "reason"];

/// One line of the per-record output. Field order is the column order.
///
/// Input columns that were absent, or empty, are written as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub row: u64,
    pub id: Option<String>,
    pub author: Option<String>,
    pub timestamp: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub number_of_likes: Option<String>,
    pub number_of_shares: Option<String>,
    pub original_text: String,
    pub cleaned_text: String,
    pub token_count: usize,
    pub label: Label,
    pub score: f64,
    pub subjectivity: f64,
}

impl<'a> From<&'a SentimentResult> for RecordRow {
    fn from(result: &'a SentimentResult) -> Self {
        let record = &result.text.record;
        RecordRow {
            row: record.row,
            id: record.id.clone(),
            author: record.author.clone(),
            timestamp: record.timestamp.clone(),
            language: record.language.clone(),
            country: record.country.clone(),
            number_of_likes: record.likes.clone(),
            number_of_shares: record.shares.clone(),
            original_text: record.text.clone(),
            cleaned_text: result.text.cleaned.clone(),
            token_count: result.text.tokens.len(),
            label: result.label,
            score: result.score,
            subjectivity: result.subjectivity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectRow {
    pub row: u64,
    pub id: Option<String>,
    pub reason: String,
}

/// An output directory being written
pub struct StagedOutput {
    target: PathBuf,
    staging: PathBuf,
    records: Writer<File>,
    rejects: Writer<File>,
    published: bool,
}

impl StagedOutput {
    /// Start a staging directory for `output`. Nothing at `output` is touched yet.
    pub fn create<P: AsRef<Path>>(output: P) -> Result<Self> {
        let target = output.as_ref().to_path_buf();
        let location = target.display().to_string();
        let name = match target.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(Error::DestinationWriteFailure(location, io::Error::new(
                io::ErrorKind::InvalidInput, "the output location needs a final path component"))),
        };
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging = parent.join(format!(".{}.staging-{}", name, process::id()));
        let fail = |err: io::Error| Error::DestinationWriteFailure(location.clone(), err);

        fs::create_dir_all(&parent).map_err(&fail)?;
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(&fail)?;
        }
        fs::create_dir(&staging).map_err(&fail)?;
        debug!("Staging output for {} in {}", location, staging.display());

        let tables = open_table(&staging.join(RECORDS_FILE), &RECORD_COLUMNS)
            .and_then(|records| Ok((records, open_table(&staging.join(REJECTS_FILE), &REJECT_COLUMNS)?)));
        let (records, rejects) = match tables {
            Ok(tables) => tables,
            Err(err) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(fail(err));
            }
        };
        // From here on, Drop cleans up the staging directory if anything fails.
        Ok(StagedOutput { target, staging, records, rejects, published: false })
    }

    fn fail(&self, err: io::Error) -> Error {
        Error::DestinationWriteFailure(self.target.display().to_string(), err)
    }

    pub fn write_result(&mut self, result: &SentimentResult) -> Result<()> {
        match self.records.serialize(RecordRow::from(result)) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub fn write_reject(&mut self, reject: &Reject) -> Result<()> {
        let row = RejectRow { row: reject.row, id: reject.id.clone(), reason: reject.reason.code().to_string() };
        match self.rejects.serialize(row) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Write the summary, mark the directory complete, and move it into place
    ///
    /// Anything already at the output location is replaced.
    pub fn publish(mut self, summary: &Summary) -> Result<PathBuf> {
        self.finish_files(summary).map_err(|err| self.fail(err))?;
        self.swap_into_place().map_err(|err| self.fail(err))?;
        self.published = true;
        info!("Published results to {}", self.target.display());
        Ok(self.target.clone())
    }

    fn finish_files(&mut self, summary: &Summary) -> io::Result<()> {
        self.records.flush()?;
        self.rejects.flush()?;
        let mut table = open_table(&self.staging.join(SUMMARY_FILE), &SUMMARY_COLUMNS)?;
        for row in summary.rows() {
            table.serialize(row)?;
        }
        table.flush()?;
        for name in &[RECORDS_FILE, REJECTS_FILE, SUMMARY_FILE] {
            File::open(self.staging.join(name))?.sync_all()?;
        }
        File::create(self.staging.join(SUCCESS_MARKER))?.sync_all()
    }

    fn swap_into_place(&self) -> io::Result<()> {
        let retired = PathBuf::from(format!("{}-old", self.staging.display()));
        let had_previous = match fs::symlink_metadata(&self.target) {
            Ok(_) => {
                fs::rename(&self.target, &retired)?;
                true
            }
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => return Err(err),
        };
        if let Err(err) = fs::rename(&self.staging, &self.target) {
            if had_previous {
                // put the old output back rather than leave nothing
                let _ = fs::rename(&retired, &self.target);
            }
            return Err(err);
        }
        if had_previous {
            let cleanup = if retired.is_dir() { fs::remove_dir_all(&retired) } else { fs::remove_file(&retired) };
            if let Err(err) = cleanup {
                warn!("Could not remove the previous output at {}: {}", retired.display(), err);
            }
        }
        Ok(())
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if !self.published {
            warn!("Discarding unpublished output in {}", self.staging.display());
            if let Err(err) = fs::remove_dir_all(&self.staging) {
                warn!("Could not remove {}: {}", self.staging.display(), err);
            }
        }
    }
}

/// A CSV file with its header already written, so even an empty table has one
fn open_table(path: &Path, columns: &[&str]) -> io::Result<Writer<File>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(columns)?;
    Ok(writer)
}

/// Check that `dir` holds a finished run
pub fn is_published<P: AsRef<Path>>(dir: P) -> bool {
    dir.as_ref().join(SUCCESS_MARKER).is_file()
}

fn read_table<T, P>(dir: P, name: &str) -> Result<Vec<T>>
    where T: for<'de> Deserialize<'de>, P: AsRef<Path> {
    let dir = dir.as_ref();
    if !is_published(dir) {
        return Err(Error::Other(format!(
            "{} has no {} marker, so the run that wrote it did not finish", dir.display(), SUCCESS_MARKER)));
    }
    let path = dir.join(name);
    let mut reader = csv::Reader::from_path(&path).map_err(|err| match err.into_kind() {
        csv::ErrorKind::Io(io_err) => Error::SourceUnavailable(path.display().to_string(), Some(io_err)),
        other => Error::Other(format!("{:?}", other)),
    })?;
    let mut rows = vec![];
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Read back the per-record results of a published run
pub fn read_records<P: AsRef<Path>>(dir: P) -> Result<Vec<RecordRow>> {
    read_table(dir, RECORDS_FILE)
}

/// Read back the summary of a published run
pub fn read_summary<P: AsRef<Path>>(dir: P) -> Result<Vec<SummaryRow>> {
    read_table(dir, SUMMARY_FILE)
}

pub fn read_rejects<P: AsRef<Path>>(dir: P) -> Result<Vec<RejectRow>> {
    read_table(dir, REJECTS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeBucket;
    use crate::normalize::NormalizedText;
    use crate::record::{RawRecord, RejectReason};
    use std::io::Read;
    use tempfile::tempdir;

    fn result(row: u64, text: &str, label: Label, score: f64) -> SentimentResult {
        SentimentResult {
            text: NormalizedText {
                record: RawRecord {
                    row,
                    id: Some(format!("id-{}", row)),
                    timestamp: Some("2017-05-12 10:00:00".to_string()),
                    language: Some("en".to_string()),
                    likes: Some("3".to_string()),
                    text: text.to_string(),
                    ..RawRecord::default()
                },
                cleaned: text.to_string(),
                tokens: text.split_whitespace().map(|t| t.to_lowercase()).collect(),
            },
            label,
            score,
            subjectivity: 0.25,
            ambiguous: false,
        }
    }

    fn header_of(path: &Path) -> String {
        let mut content = String::new();
        File::open(path).unwrap().read_to_string(&mut content).unwrap();
        content.lines().next().unwrap_or("").to_string()
    }

    #[test]
    fn publishes_all_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("results");
        let results = vec![
            result(1, "I love this, \"really\"", Label::Positive, 0.65),
            result(2, "multi\nline", Label::Neutral, -0.0333),
        ];
        let mut summary = Summary::new();
        let mut staged = StagedOutput::create(&out).unwrap();
        for r in &results {
            staged.write_result(r).unwrap();
            summary.record(r, TimeBucket::Day);
        }
        staged.write_reject(&Reject { row: 3, id: None, reason: RejectReason::EmptyText }).unwrap();
        assert!(!out.exists());
        staged.publish(&summary).unwrap();

        assert!(is_published(&out));
        assert_eq!(header_of(&out.join(RECORDS_FILE)), RECORD_COLUMNS.join(","));
        assert_eq!(header_of(&out.join(SUMMARY_FILE)), SUMMARY_COLUMNS.join(","));

        let rows = read_records(&out).unwrap();
        let expected: Vec<RecordRow> = results.iter().map(RecordRow::from).collect();
        assert_eq!(rows, expected);

        let rejects = read_rejects(&out).unwrap();
        assert_eq!(rejects, vec![RejectRow { row: 3, id: None, reason: "empty_text".to_string() }]);

        let summary_rows = read_summary(&out).unwrap();
        assert_eq!(summary_rows, summary.rows());
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("empty");
        StagedOutput::create(&out).unwrap().publish(&Summary::new()).unwrap();
        assert_eq!(header_of(&out.join(RECORDS_FILE)), RECORD_COLUMNS.join(","));
        assert_eq!(header_of(&out.join(REJECTS_FILE)), REJECT_COLUMNS.join(","));
        assert!(read_records(&out).unwrap().is_empty());
        assert_eq!(read_summary(&out).unwrap().len(), 3);
    }

    #[test]
    fn dropping_unpublished_output_leaves_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("abandoned");
        {
            let mut staged = StagedOutput::create(&out).unwrap();
            staged.write_result(&result(1, "half done", Label::Neutral, 0.0)).unwrap();
        }
        assert!(!out.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn republishing_replaces_previous_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("results");
        let mut first = StagedOutput::create(&out).unwrap();
        first.write_result(&result(1, "old", Label::Neutral, 0.0)).unwrap();
        first.publish(&Summary::new()).unwrap();

        let second = StagedOutput::create(&out).unwrap();
        second.publish(&Summary::new()).unwrap();
        assert!(read_records(&out).unwrap().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unfinished_directories_are_not_read() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(RECORDS_FILE), RECORD_COLUMNS.join(",")).unwrap();
        assert!(read_records(dir.path()).is_err());
    }

    #[test]
    fn unwritable_destination_is_a_write_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        match StagedOutput::create(blocker.join("results")) {
            Err(ref err) if err.is_destination() => (),
            _ => panic!("expected a destination write failure"),
        }
    }
}
