//! Parsing of the tiktoken rank file format (also called "mergeable ranks" in the tiktoken code).
//!
//! Each line is a single record of the form `<base64 token> <rank>`.  There is no header, no
//! comment syntax, and nothing after the last record.  The token is usually encoded with the
//! standard base64 alphabet, but files produced by other tools sometimes use the URL-safe
//! alphabet instead, so both are accepted.
use crate::error::*;
use crate::{Rank, Result, Token};
use base64::{engine::general_purpose, Engine as _};
use snafu::{ensure, OptionExt, ResultExt};
use std::io::{BufRead, Write};

/// Parse a single rank file line into the token bytes and their rank.
///
/// `line` is the 1-based line number, used only for error reporting.  Along with the token and
/// rank, returns the raw base64 segment the token was decoded from.
pub(crate) fn parse_line(line: usize, text: &str) -> Result<(&str, Token, Rank)> {
    let (segment, rank) = text
        .split_once(' ')
        .context(MissingSeparatorSnafu { line })?;

    let token = decode_token(segment).with_context(|_| Base64DecodeSnafu {
        line,
        segment: segment.to_string(),
    })?;
    ensure!(
        !token.is_empty(),
        EmptyTokenSnafu {
            line,
            segment: segment.to_string(),
        }
    );

    let rank = rank.parse::<Rank>().with_context(|_| InvalidRankSnafu {
        line,
        segment: rank.to_string(),
    })?;

    Ok((segment, token, rank))
}

/// Decode the base64 token segment of a line.
///
/// If neither alphabet works, the error from the standard alphabet is the one reported since
/// that's what well-formed tiktoken files use.
fn decode_token(segment: &str) -> std::result::Result<Token, base64::DecodeError> {
    general_purpose::STANDARD
        .decode(segment)
        .or_else(|e| general_purpose::URL_SAFE.decode(segment).map_err(|_| e))
}

/// Read all of the records in a rank file, calling `f` with the line number, the raw token segment,
/// and the parsed contents of each.
///
/// Lines are read as bytes and ended by `\n` or `\r\n`.  A line that isn't UTF-8 is a malformed
/// record, not a read failure.  Stops at the first error, either from reading and parsing or from
/// `f` itself.
pub(crate) fn for_each_record<R, F>(reader: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str, Token, Rank) -> Result<()>,
{
    for (index, bytes) in reader.split(b'\n').enumerate() {
        let line = index + 1;
        let mut bytes = bytes.context(ReadLineSnafu { line })?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let text = std::str::from_utf8(&bytes).map_err(|_| {
            let segment = bytes.split(|b| *b == b' ').next().unwrap_or_default();
            NonUtf8LineSnafu {
                line,
                segment: String::from_utf8_lossy(segment).into_owned(),
            }
            .build()
        })?;
        let (segment, token, rank) = parse_line(line, text)?;

        f(line, segment, token, rank)?;
    }

    Ok(())
}

/// Write one record in the canonical form: standard base64 alphabet, decimal rank, line feed.
pub(crate) fn write_record(writer: &mut impl Write, token: &[u8], rank: Rank) -> Result<()> {
    writeln!(writer, "{} {}", general_purpose::STANDARD.encode(token), rank).context(WriteSnafu)
}
