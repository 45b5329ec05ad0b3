//
// Errors
//
use std::error;
use std::fmt;
use std::io;
use std::result;

/// Type alias for pipeline errors
pub type Result<X> = result::Result<X, Error>;

/// Everything that can abort a run.
///
/// Problems with a single tweet are never errors; those become a `Reject` and are counted.
#[derive(Debug)]
pub enum Error {
    SourceUnavailable(String, Option<io::Error>),
    MissingColumn(String),
    DestinationWriteFailure(String, io::Error),
    InvalidConfig(String),
    CsvError(csv::Error),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::SourceUnavailable(ref location, ref opt_err) => {
                write!(f,
                    "The input {} could not be read. Wrong path, or missing permissions? \
                    The OS error was: ",
                    location)?;
                if let Some(ref err) = *opt_err { write!(f, "{}", err) }
                else { write!(f, "Unknown") }
            },
            Error::MissingColumn(ref column) => write!(f,
                "The input header has no {:?} column, so there is no tweet text to analyze. \
                Use --text-column if the dataset names it differently.",
                column),
            Error::DestinationWriteFailure(ref location, ref err) => {
                write!(f, "Could not write results to {}: {}", location, err)
            },
            Error::InvalidConfig(ref info) => write!(f, "Invalid configuration: {}", info),
            Error::CsvError(ref err) => write!(f, "CSV error: {}", err),
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::SourceUnavailable(_, Some(ref err)) => Some(err),
            Error::SourceUnavailable(_, None) => None,
            Error::MissingColumn(_) => None,
            Error::DestinationWriteFailure(_, ref err) => Some(err),
            Error::InvalidConfig(_) => None,
            Error::CsvError(ref err) => Some(err),
            Error::Other(_) => None,
        }
    }
}

impl Error {
    /// Whether this error came from the output side of the run
    pub fn is_destination(&self) -> bool {
        match *self {
            Error::DestinationWriteFailure(_, _) => true,
            _ => false,
        }
    }
}

//
// Convert library errors into Error
//
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn source_unavailable_mentions_location_and_cause() {
        let err = Error::SourceUnavailable(
            "tweets.csv".to_string(),
            Some(io::Error::new(io::ErrorKind::NotFound, "no such file")));
        let text = err.to_string();
        assert!(text.contains("tweets.csv"));
        assert!(text.contains("no such file"));
        assert!(err.source().is_some());
    }

    #[test]
    fn only_write_failures_are_destination_errors() {
        let write = Error::DestinationWriteFailure(
            "out".to_string(), io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(write.is_destination());
        assert!(!Error::MissingColumn("content".to_string()).is_destination());
    }

    #[test]
    fn csv_errors_convert_with_question_mark() {
        fn parse(input: &[u8]) -> Result<Vec<(String, u32)>> {
            let mut rows = vec![];
            for row in csv::Reader::from_reader(input).deserialize() {
                rows.push(row?);
            }
            Ok(rows)
        }
        match parse(b"name,count\nx,not a number\n") {
            Err(Error::CsvError(_)) => (),
            other => panic!("expected a csv error, got {:?}", other),
        }
    }
}
