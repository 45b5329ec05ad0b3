//! Tweet records straight out of the input CSV
//!
//! The reader is lazy and never gives up on a bad row: a row with the wrong number of cells or
//! no text comes back as a `Reject`. Only a source that can't be opened or read ends the run.
//!
//! Every line after the header is a row, blank ones included. The csv parser skips blank lines,
//! so the reader counts the lines each record spans and turns the gaps back into rejects.
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Terminator};

use crate::config::Config;
use crate::errors::*;

/// One data row of the input. Never changed after it is read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based position among the data rows (the header is not counted)
    pub row: u64,
    pub id: Option<String>,
    pub author: Option<String>,
    pub timestamp: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub likes: Option<String>,
    pub shares: Option<String>,
    pub text: String,
}

/// Why a row did not make it to a sentiment result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    Malformed,
    EmptyText,
    EmptyAfterNormalization,
    TooShort,
}

impl RejectReason {
    pub const ALL: [RejectReason; 4] = [
        RejectReason::Malformed,
        RejectReason::EmptyText,
        RejectReason::EmptyAfterNormalization,
        RejectReason::TooShort,
    ];

    /// Stable code written to the reject file
    pub fn code(&self) -> &'static str {
        match *self {
            RejectReason::Malformed => "malformed",
            RejectReason::EmptyText => "empty_text",
            RejectReason::EmptyAfterNormalization => "empty_after_normalization",
            RejectReason::TooShort => "too_short",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A row that was counted but not classified
#[derive(Debug, Clone, PartialEq)]
pub struct Reject {
    pub row: u64,
    pub id: Option<String>,
    pub reason: RejectReason,
}

impl Reject {
    pub fn of(record: &RawRecord, reason: RejectReason) -> Self {
        Reject { row: record.row, id: record.id.clone(), reason }
    }
}

/// What became of a single row: a record to carry on with, or a reject
pub type ReadOutcome = ::std::result::Result<RawRecord, Reject>;

/// Column positions resolved from the header
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub width: usize,
    pub text: usize,
    pub id: Option<usize>,
    pub author: Option<usize>,
    pub timestamp: Option<usize>,
    pub language: Option<usize>,
    pub country: Option<usize>,
    pub likes: Option<usize>,
    pub shares: Option<usize>,
}

impl Schema {
    /// Find the configured columns in a header. Names match case-insensitively.
    pub fn resolve(header: &[String], config: &Config) -> Result<Self> {
        let find = |name: &str| {
            let name = name.trim().to_lowercase();
            header.iter().position(|col| col.trim().to_lowercase() == name)
        };
        let text = find(&config.text_column)
            .ok_or_else(|| Error::MissingColumn(config.text_column.clone()))?;
        Ok(Schema {
            width: header.len(),
            text,
            id: find(&config.id_column),
            author: find(&config.author_column),
            timestamp: find(&config.timestamp_column),
            language: find(&config.language_column),
            country: find(&config.country_column),
            likes: find(&config.likes_column),
            shares: find(&config.shares_column),
        })
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// The source as the csv parser sees it, remembering enough to tell whether the input ended
/// with a line break
struct Tracked<R> {
    inner: R,
    consumed: u64,
    last: Option<u8>,
    exhausted: bool,
}

impl<R: io::Read> io::Read for Tracked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.consumed += n as u64;
            self.last = Some(buf[n - 1]);
        } else if !buf.is_empty() {
            self.exhausted = true;
        }
        Ok(n)
    }
}

impl<R> Tracked<R> {
    /// Whether a record ending at byte `offset` ran into the end of the input without a newline
    fn unterminated_at(&self, offset: u64) -> bool {
        self.exhausted && offset == self.consumed && self.last != Some(b'\n')
    }
}

/// Stream `RawRecord`s (or rejects) from a delimited file with a header row
pub struct RecordReader<R> {
    location: String,
    schema: Schema,
    reader: csv::Reader<Tracked<R>>,
    buffer: ByteRecord,
    /// Rows already read but not yet handed out
    pending: VecDeque<ReadOutcome>,
    row: u64,
    /// Line the next row starts on
    line: u64,
    done: bool,
}

impl RecordReader<File> {
    /// Open a CSV file. Failing to open it, or to read its header, is fatal.
    pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let location = path.as_ref().display().to_string();
        let file = File::open(path.as_ref())
            .map_err(|err| Error::SourceUnavailable(location.clone(), Some(err)))?;
        RecordReader::from_reader(file, location, config)
    }
}

impl<R: io::Read> RecordReader<R> {
    pub fn from_reader(input: R, location: String, config: &Config) -> Result<Self> {
        // Only \n ends a record, so a "\r\n" blank line still comes back as a (one cell) record
        // and line counts stay exact. The stray \r is trimmed from the last cell instead.
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_reader(Tracked { inner: input, consumed: 0, last: None, exhausted: false });
        let header: Vec<String> = {
            let cells = reader.byte_headers().map_err(|err| source_error(&location, err))?;
            (0..cells.len()).filter_map(|i| cell(cells, i)).map(lossy).collect()
        };
        let line = reader.position().line();
        let schema = Schema::resolve(&header, config)?;
        info!("Reading tweets from {} (text in column {:?}, {} columns)",
            location, header[schema.text], schema.width);
        Ok(RecordReader {
            location,
            schema,
            reader,
            buffer: ByteRecord::new(),
            pending: VecDeque::new(),
            row: 0,
            line,
            done: false,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Turn one CSV row into a record, or say why it can't be one
    fn parse(&self, row: u64, cells: &ByteRecord) -> ReadOutcome {
        let field = |idx: Option<usize>| idx
            .and_then(|i| cell(cells, i))
            .map(lossy)
            .filter(|value| !value.trim().is_empty());
        let id = field(self.schema.id);
        if cells.len() != self.schema.width {
            return Err(Reject { row, id, reason: RejectReason::Malformed });
        }
        let text = match field(Some(self.schema.text)) {
            Some(text) => text,
            None => return Err(Reject { row, id, reason: RejectReason::EmptyText }),
        };
        Ok(RawRecord {
            row,
            id,
            author: field(self.schema.author),
            timestamp: field(self.schema.timestamp),
            language: field(self.schema.language),
            country: field(self.schema.country),
            likes: field(self.schema.likes),
            shares: field(self.schema.shares),
            text,
        })
    }

    /// A line the csv parser skipped: an empty text, or too few cells if there should be more
    fn blank(&self, row: u64) -> ReadOutcome {
        let reason = if self.schema.width == 1 { RejectReason::EmptyText } else { RejectReason::Malformed };
        Err(Reject { row, id: None, reason })
    }

    fn queue(&mut self, outcome: ReadOutcome) {
        if let Err(ref reject) = outcome {
            debug!("Row {} rejected: {}", reject.row, reject.reason);
        }
        self.pending.push_back(outcome);
    }

    /// Queue a reject for each of `count` blank lines
    fn queue_blanks(&mut self, count: u64) {
        for _ in 0..count {
            self.row += 1;
            let outcome = self.blank(self.row);
            self.queue(outcome);
        }
    }

    /// Read one more record from the source, queueing it with any blank lines before it
    fn fill(&mut self) -> Result<()> {
        let more = self.reader.read_byte_record(&mut self.buffer)
            .map_err(|err| source_error(&self.location, err))?;
        let (end_line, end_byte) = {
            let position = self.reader.position();
            (position.line(), position.byte())
        };
        let spanned = end_line - self.line;
        self.line = end_line;
        if !more {
            self.done = true;
            self.queue_blanks(spanned);
            return Ok(());
        }
        let inner_breaks: u64 = self.buffer.iter()
            .map(|value| value.iter().filter(|&&b| b == b'\n').count() as u64)
            .sum();
        let own_break = if self.reader.get_ref().unterminated_at(end_byte) { 0 } else { 1 };
        self.queue_blanks(spanned.saturating_sub(inner_breaks + own_break));
        self.row += 1;
        let outcome = self.parse(self.row, &self.buffer);
        self.queue(outcome);
        Ok(())
    }
}

impl<R: io::Read> Iterator for RecordReader<R> {
    type Item = Result<ReadOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(outcome) = self.pending.pop_front() {
                return Some(Ok(outcome));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fill() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

/// Cell `i` of a record, without the \r a CRLF line leaves on the last cell
fn cell(cells: &ByteRecord, i: usize) -> Option<&[u8]> {
    let value = cells.get(i)?;
    if i + 1 == cells.len() && value.last() == Some(&b'\r') {
        Some(&value[..value.len() - 1])
    } else {
        Some(value)
    }
}

/// Bad bytes become U+FFFD rather than failing the row
fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn source_error(location: &str, err: csv::Error) -> Error {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Error::SourceUnavailable(location.to_string(), Some(io_err)),
            other => Error::Other(format!("{:?}", other)),
        }
    } else {
        Error::CsvError(err)
    }
}
