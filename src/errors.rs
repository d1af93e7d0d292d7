/*
 * Copyright 2025 The MITRE Corporation

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
 */

use nom::error::{VerboseError, VerboseErrorKind};
use thiserror::Error;

/// Lines longer than this are cut short when echoed back in an error message.
const PRINTABLE_LINE_LIMIT: usize = 200;

/// Why a timestamp candidate is not a `MM/DD/YY HH:MM:SS` timestamp
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The candidate doesn't have the right shape (digits, separators, width)
    #[error("malformed timestamp {candidate:?}: {detail}")]
    Shape { candidate: String, detail: String },
    /// The shape is right but a component isn't a real calendar/clock value
    #[error("timestamp {component} {value:02} is out of range")]
    OutOfRange { component: &'static str, value: u32 },
}

/// The structural reason a line isn't a log line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{0}")]
    InvalidTimestamp(TimestampError),
    #[error("line ends before the severity field")]
    MissingSeverity,
    #[error("expected ':' at column 27, found {}", describe_found(.found))]
    MissingDelimiter { found: Option<char> },
    #[error("no message after the ':' delimiter")]
    EmptyMessage,
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::InvalidTimestamp(_) => RejectionKind::InvalidTimestamp,
            Rejection::MissingSeverity => RejectionKind::MissingSeverity,
            Rejection::MissingDelimiter { .. } => RejectionKind::MissingDelimiter,
            Rejection::EmptyMessage => RejectionKind::EmptyMessage,
        }
    }
}

/// Payload-free version of [`Rejection`], used for tallying
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectionKind {
    InvalidTimestamp,
    MissingSeverity,
    MissingDelimiter,
    EmptyMessage,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::InvalidTimestamp => "invalid_timestamp",
            RejectionKind::MissingSeverity => "missing_severity",
            RejectionKind::MissingDelimiter => "missing_delimiter",
            RejectionKind::EmptyMessage => "empty_message",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Errors raised while turning a line into a [`crate::LogRecord`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogLineError {
    /// Extraction was asked for on a line the filter rejects
    #[error("invalid log line ({reason}): {}", printable_line(.line))]
    InvalidLogLine { reason: Rejection, line: String },
    /// The severity field holds something other than INFO, TRACE or WARNING
    #[error("malformed severity {token:?}: {}", printable_line(.line))]
    MalformedSeverity { token: String, line: String },
}

fn describe_found(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{:?}", c),
        None => "end of line".to_string(),
    }
}

/// Quotes a line for an error message, dropping its terminator and trimming it if it's very long.
pub(crate) fn printable_line(line: &str) -> String {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.chars().count() > PRINTABLE_LINE_LIMIT {
        let printable: String = line.chars().take(PRINTABLE_LINE_LIMIT).collect();
        format!("{:?}[...]", printable)
    } else {
        format!("{:?}", line)
    }
}

// == Error conversion code ==
// Loosely based on nom/src/error.rs/convert_error, reduced to a single line since
// timestamp candidates never span lines.

pub trait Offset {
    /// offset between the first byte of self and the first byte of the argument,
    /// or `None` if the argument doesn't start inside self
    fn offset(&self, second: &Self) -> Option<usize>;
}

impl<'a> Offset for &'a str {
    fn offset(&self, second: &Self) -> Option<usize> {
        let fst = self.as_ptr() as usize;
        let snd = second.as_ptr() as usize;

        snd.checked_sub(fst).filter(|offset| *offset <= self.len())
    }
}

/// transforms a `VerboseError` produced while parsing `input` into a one-line description:
/// the innermost failure with its 1-indexed character position, followed by the enclosing
/// contexts. Error positions that don't point into `input` are reported without one.
pub fn pretty_print_error(input: &str, e: VerboseError<&str>) -> String {
    let mut failure: Option<String> = None;
    let mut contexts: Vec<&str> = Vec::new();

    for (substring, kind) in e.errors.iter() {
        let position = match input.offset(substring).and_then(|offset| input.get(..offset)) {
            Some(prefix) => format!("pos {}", prefix.chars().count() + 1),
            None => format!("remaining {:?}", substring),
        };
        let found = match substring.chars().next() {
            Some(c) => format!("{:?}", c),
            None => "end of input".to_string(),
        };

        match kind {
            VerboseErrorKind::Char(c) if failure.is_none() => {
                failure = Some(format!("{}: expected '{}', found {}", position, c, found));
            }
            VerboseErrorKind::Nom(err) if failure.is_none() => {
                failure = Some(format!("{}: {:?} failed, found {}", position, err, found));
            }
            VerboseErrorKind::Context(s) => contexts.push(s),
            _ => {}
        }
    }

    let mut result = failure.unwrap_or_else(|| "unrecognized input".to_string());
    if !contexts.is_empty() {
        result.push_str(" in ");
        result.push_str(&contexts.join(" < "));
    }
    result
}
