use std::ops::Range;
use thiserror::Error;

/// Why a piece of command-line text could not be parsed. Spans are byte offsets
/// into the text handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated search pattern at {}..{}", span.start, span.end)]
    UnterminatedPattern { span: Range<usize> },

    #[error("bad mark name at {}..{}", span.start, span.end)]
    BadMarkName { span: Range<usize> },

    #[error("unrecognised address '{text}' at {}..{}", span.start, span.end)]
    Unrecognised { span: Range<usize>, text: String },

    #[error("unrecognised address range")]
    UnrecognisedRange,

    #[error("unrecognised command")]
    UnknownCommand,

    #[error("invalid command suffix '{0}'")]
    InvalidSuffix(String),

    #[error("missing pattern delimiter")]
    MissingDelimiter,

    #[error("invalid window size")]
    InvalidWindowSize,
}

impl ParseError {
    /// Moves the span forward by `by` bytes, for errors found in a slice of a
    /// longer line.
    pub fn shifted(self, by: usize) -> Self {
        match self {
            ParseError::UnterminatedPattern { span } => ParseError::UnterminatedPattern {
                span: span.start + by..span.end + by,
            },
            ParseError::BadMarkName { span } => ParseError::BadMarkName {
                span: span.start + by..span.end + by,
            },
            ParseError::Unrecognised { span, text } => ParseError::Unrecognised {
                span: span.start + by..span.end + by,
                text,
            },
            other => other,
        }
    }
}

/// The broad classes errors fall into. Used by the loop to decide how much to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Resolution,
    Range,
    State,
    Io,
}

#[derive(Debug, Error)]
pub enum EdError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid address")]
    InvalidLine,

    #[error("unknown mark '{0}'")]
    UnknownMark(char),

    #[error("no match")]
    NoMatch,

    #[error("address range start > end")]
    BadRange,

    #[error("a range may not be specified")]
    RangeNotAllowed,

    #[error("invalid destination address")]
    InvalidDestination,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("no previous pattern")]
    NoPreviousPattern,

    #[error("no previous substitution")]
    NoPreviousSubstitution,

    #[error("no substitution performed")]
    NoSubstitution,

    #[error("no current filename")]
    MissingFilename,

    #[error("buffer modified")]
    UnsavedChanges,

    #[error("nothing to put")]
    EmptyCutBuffer,

    #[error("command cannot be used within a global command")]
    NotAllowedInGlobal,

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EdError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EdError::Parse(_) | EdError::Regex(_) => ErrorCategory::Parse,
            EdError::InvalidLine | EdError::UnknownMark(_) | EdError::NoMatch => {
                ErrorCategory::Resolution
            }
            EdError::BadRange | EdError::RangeNotAllowed | EdError::InvalidDestination => {
                ErrorCategory::Range
            }
            EdError::NothingToUndo
            | EdError::NoPreviousPattern
            | EdError::NoPreviousSubstitution
            | EdError::NoSubstitution
            | EdError::MissingFilename
            | EdError::UnsavedChanges
            | EdError::EmptyCutBuffer
            | EdError::NotAllowedInGlobal => ErrorCategory::State,
            EdError::Io(_) => ErrorCategory::Io,
        }
    }
}

pub type EdResult<T> = Result<T, EdError>;
