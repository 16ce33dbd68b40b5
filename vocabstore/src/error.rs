use crate::Rank;
use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VocabError {
    #[snafu(display("File I/O error on file '{}'", path.display()))]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Error reading line {line} of the rank file"))]
    ReadLine {
        line: usize,
        source: std::io::Error,
    },

    #[snafu(display("Error rewinding the rank file stream to its start"))]
    Rewind { source: std::io::Error },

    #[snafu(display("Error writing rank file records"))]
    Write { source: std::io::Error },

    #[snafu(display("Line {line} of the rank file has no space between token and rank"))]
    MissingSeparator { line: usize },

    #[snafu(display("Line {line} of the rank file isn't valid UTF-8 (token `{segment}`)"))]
    NonUtf8Line { line: usize, segment: String },

    #[snafu(display("Line {line} of the rank file has an invalid base64 token `{segment}`"))]
    Base64Decode {
        line: usize,
        segment: String,
        source: base64::DecodeError,
    },

    #[snafu(display("Line {line} of the rank file has a token `{segment}` that decodes to zero bytes"))]
    EmptyToken { line: usize, segment: String },

    #[snafu(display("Line {line} of the rank file has an invalid rank `{segment}`"))]
    InvalidRank {
        line: usize,
        segment: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("Line {line} of the rank file repeats the token `{segment}`"))]
    DuplicateToken { line: usize, segment: String },

    #[snafu(display(
        "Rank {rank} is assigned to more than one token ({tokens} tokens but only {ranks} distinct ranks)"
    ))]
    DuplicateRank {
        rank: Rank,
        tokens: usize,
        ranks: usize,
    },

    #[snafu(display("'{name}' can't be used as a vocabulary name"))]
    InvalidEncodingName { name: String },

    #[snafu(display("The encoding '{encoding}' isn't one of the supported encodings"))]
    UnknownEncoding { encoding: String },

    #[snafu(display("The token {token:?} is not in the vocabulary"))]
    UnknownToken { token: Vec<u8> },

    #[snafu(display("The rank {rank} is not in the vocabulary"))]
    UnknownRank { rank: Rank },
}

/// Broad classification of [`VocabError`]s, for callers that need to decide what to do about a
/// failure without matching on every variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ErrorKind {
    /// The rank file doesn't exist
    NotFound,

    /// Any other failure to open, read, or write a rank file
    Io,

    /// A rank file record is malformed
    Parse,

    /// The input is well-formed but inconsistent, such as two tokens with the same rank
    InvalidArgument,

    /// A query asked for a token or rank the vocabulary doesn't have
    OutOfBounds,
}

impl VocabError {
    pub fn kind(&self) -> ErrorKind {
        use VocabError::*;

        match self {
            FileIo { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            FileIo { .. } | ReadLine { .. } | Rewind { .. } | Write { .. } => ErrorKind::Io,
            MissingSeparator { .. }
            | NonUtf8Line { .. }
            | Base64Decode { .. }
            | EmptyToken { .. }
            | InvalidRank { .. }
            | DuplicateToken { .. } => ErrorKind::Parse,
            DuplicateRank { .. } | InvalidEncodingName { .. } | UnknownEncoding { .. } => {
                ErrorKind::InvalidArgument
            }
            UnknownToken { .. } | UnknownRank { .. } => ErrorKind::OutOfBounds,
        }
    }

    /// The 1-based line of the rank file this error refers to, if it refers to one.
    pub fn line(&self) -> Option<usize> {
        use VocabError::*;

        match self {
            ReadLine { line, .. }
            | MissingSeparator { line }
            | NonUtf8Line { line, .. }
            | Base64Decode { line, .. }
            | EmptyToken { line, .. }
            | InvalidRank { line, .. }
            | DuplicateToken { line, .. } => Some(*line),
            _ => None,
        }
    }
}
