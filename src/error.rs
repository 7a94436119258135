use quick_error::quick_error;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::io::Error as IOError;

use crate::atlas::{Atlas, Hemisphere, RecordKey, SourceKey};

quick_error! {
    /// Error type for all fatal error variants originated by this crate.
    ///
    /// Problems with the content of a single statistics file are not fatal, they are
    /// reported as [`ParseError`] values inside a [`crate::SubjectTable`].
    #[derive(Debug)]
    pub enum FsStatsError {
        /// A cortical atlas was paired with no hemisphere, or the subcortical atlas with one.
        InvalidSource(hemisphere: Hemisphere, atlas: Atlas) {
            display("Invalid stats source: atlas {} cannot be combined with hemisphere {}", atlas, hemisphere)
        }

        /// A single stats file could not be parsed, used by the file-level readers only.
        Parse(err: ParseError) {
            from()
            display("{}", err)
            source(err)
        }

        /// The same subject id was given for more than one subject of a cohort.
        DuplicateSubject(subject_id: String) {
            display("Subject id '{}' is used for more than one subject", subject_id)
        }

        /// The cache storage is required but cannot be used.
        CacheUnavailable(detail: String) {
            display("Cache storage unavailable: {}", detail)
        }

        /// Serialization of a cache entry failed.
        CacheFormat(err: serde_json::Error) {
            from()
            display("Invalid cache entry: {}", err)
            source(err)
        }

        /// The bounded worker pool could not be created.
        WorkerPool(err: rayon::ThreadPoolBuildError) {
            from()
            display("Failed to create worker pool: {}", err)
            source(err)
        }

        /// Writing a table as CSV failed.
        Csv(err: csv::Error) {
            from()
            display("CSV output error: {}", err)
            source(err)
        }

        /// The run was cancelled before the subject was completed.
        Cancelled {
            display("Cancelled")
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, FsStatsError>;


/// The kinds of problems found in the content of one stats file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseErrorKind {
    MalformedHeader,
    MalformedRow,
    EmptyFile,
    UnknownColumn,
    UnknownRegion,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParseErrorKind::MalformedHeader => "MALFORMED_HEADER",
            ParseErrorKind::MalformedRow => "MALFORMED_ROW",
            ParseErrorKind::EmptyFile => "EMPTY_FILE",
            ParseErrorKind::UnknownColumn => "UNKNOWN_COLUMN",
            ParseErrorKind::UnknownRegion => "UNKNOWN_REGION",
        };
        write!(f, "{}", name)
    }
}


/// A problem with the content of one stats file. The `line_number` is 1-based and absent
/// for problems that concern the file as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line_number: Option<usize>,
    pub detail: String,
}

impl ParseError {
    pub fn new<S: Into<String>>(kind: ParseErrorKind, line_number: Option<usize>, detail: S) -> ParseError {
        ParseError {
            kind,
            line_number,
            detail: detail.into(),
        }
    }

    pub fn at_line<S: Into<String>>(kind: ParseErrorKind, line_number: usize, detail: S) -> ParseError {
        ParseError::new(kind, Some(line_number), detail)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "{} at line {}: {}", self.kind, line, self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

impl std::error::Error for ParseError {}


/// A [`ParseError`] together with the stats source it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceParseError {
    pub source: SourceKey,
    pub error: ParseError,
}

impl fmt::Display for SourceParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}


/// More than one record with the same identifying key was produced for one subject.
/// All records carrying the key are dropped, `sources` lists where each of them came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRecordError {
    pub key: RecordKey,
    pub sources: Vec<SourceKey>,
}

impl fmt::Display for DuplicateRecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sources: Vec<String> = self.sources.iter().map(|s| s.to_string()).collect();
        write!(f, "Duplicate record {} produced {} times (from {})", self.key, self.sources.len(), sources.join(", "))
    }
}

impl std::error::Error for DuplicateRecordError {}
