/**
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

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{LogLineError, Rejection};
use crate::timestamp::{parse_timestamp, TIMESTAMP_WIDTH};

/// Character offset where the severity field ends and the message zone begins
pub const MESSAGE_OFFSET: usize = 26;
/// The message zone has to start with this character
pub const DELIMITER: char = ':';

/// Severity of a log record.
///
/// Only INFO, TRACE and WARNING show up in well-formed logs; anything else found in the
/// severity field is kept verbatim as `Unknown` so it can be reported instead of guessed at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Info,
    Trace,
    Warning,
    Unknown(String),
}

impl Severity {
    /// Maps a trimmed severity token to its variant. Matching is case-sensitive.
    pub fn parse(token: &str) -> Self {
        match token {
            "INFO" => Severity::Info,
            "TRACE" => Severity::Trace,
            "WARNING" => Severity::Warning,
            other => Severity::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "INFO",
            Severity::Trace => "TRACE",
            Severity::Warning => "WARNING",
            Severity::Unknown(token) => token.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Severity::Unknown(_))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::parse(&value)
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

/// A log line broken into its three fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// The timestamp exactly as it appeared in the line
    pub timestamp: String,
    pub log_level: Severity,
    /// Everything from the delimiter onward, whitespace-trimmed
    pub message: String,
}

impl LogRecord {
    /// The record's timestamp as a calendar value
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp).ok()
    }
}

/// Writes the record back out in the columnar layout.
///
/// A severity shorter than the 9-character field gets a leading space and is padded out,
/// one that fills it is written as-is. Longer tokens can't come from a parsed line; they
/// push the message past offset 26.
impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field_width = MESSAGE_OFFSET - TIMESTAMP_WIDTH;
        if self.log_level.as_str().chars().count() < field_width {
            write!(
                f,
                "{} {:<width$}{}",
                self.timestamp,
                self.log_level,
                self.message,
                width = field_width - 1
            )
        } else {
            write!(f, "{}{}{}", self.timestamp, self.log_level, self.message)
        }
    }
}

/// What to do with a severity field that isn't INFO, TRACE or WARNING
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityPolicy {
    /// Keep the token as [`Severity::Unknown`]
    #[default]
    Lenient,
    /// Fail extraction with [`LogLineError::MalformedSeverity`]
    Strict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub severity: SeverityPolicy,
}

/// Extracts [`LogRecord`]s from lines, according to a [`ParserConfig`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineParser {
    config: ParserConfig,
}

impl LineParser {
    pub fn new(config: ParserConfig) -> Self {
        LineParser { config }
    }

    /// A parser that refuses severities other than INFO, TRACE and WARNING
    pub fn strict() -> Self {
        LineParser::new(ParserConfig {
            severity: SeverityPolicy::Strict,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Converts a log line into a [`LogRecord`].
    ///
    /// Fails with [`LogLineError::InvalidLogLine`] for any line [`is_log_line`] rejects, so a
    /// partially populated record is never produced. Every accepted line yields a record
    /// unless the parser is strict about severities.
    pub fn to_record(&self, line: &str) -> Result<LogRecord, LogLineError> {
        classify_line(line).map_err(|reason| LogLineError::InvalidLogLine {
            reason,
            line: line.to_string(),
        })?;

        let zones = Zones::split(line);
        let log_level = Severity::parse(zones.severity.trim());
        if !log_level.is_known() && self.config.severity == SeverityPolicy::Strict {
            return Err(LogLineError::MalformedSeverity {
                token: log_level.as_str().to_string(),
                line: line.to_string(),
            });
        }

        Ok(LogRecord {
            timestamp: zones.timestamp.to_string(),
            log_level,
            message: zones.message.trim().to_string(),
        })
    }
}

/// The three fixed-width zones of a line. Offsets are in characters; a line too short for
/// a zone leaves it (and every zone after it) empty.
struct Zones<'a> {
    timestamp: &'a str,
    severity: &'a str,
    message: &'a str,
}

impl<'a> Zones<'a> {
    fn split(line: &'a str) -> Self {
        let timestamp_end = byte_offset(line, TIMESTAMP_WIDTH);
        let severity_end = byte_offset(line, MESSAGE_OFFSET);
        Zones {
            timestamp: &line[..timestamp_end],
            severity: &line[timestamp_end..severity_end],
            message: &line[severity_end..],
        }
    }
}

/// Byte index of the `chars`-th character, or the end of the line if it's shorter than that
fn byte_offset(line: &str, chars: usize) -> usize {
    line.char_indices()
        .nth(chars)
        .map_or(line.len(), |(index, _)| index)
}

fn strip_terminator(s: &str) -> &str {
    match s.strip_suffix('\n') {
        Some(s) => s.strip_suffix('\r').unwrap_or(s),
        None => s,
    }
}

/// Decides whether `line` is a log line, and if not, why not.
///
/// The checks only look at the line's own content:
/// - characters `[0, 17)` must be a valid `MM/DD/YY HH:MM:SS` timestamp
/// - the line has to continue past the timestamp into the severity field
/// - the character at offset 26 must be `:`
/// - something other than the line terminator must follow that `:`
pub fn classify_line(line: &str) -> Result<(), Rejection> {
    let zones = Zones::split(line);

    parse_timestamp(zones.timestamp).map_err(Rejection::InvalidTimestamp)?;

    if zones.severity.is_empty() {
        return Err(Rejection::MissingSeverity);
    }

    let mut message = zones.message.chars();
    match message.next() {
        Some(DELIMITER) => {}
        found => return Err(Rejection::MissingDelimiter { found }),
    }

    if strip_terminator(message.as_str()).is_empty() {
        return Err(Rejection::EmptyMessage);
    }

    Ok(())
}

/// Returns true if `line` follows the timestamp/severity/message layout
pub fn is_log_line(line: &str) -> bool {
    classify_line(line).is_ok()
}

/// [`LineParser::to_record`] with the default (lenient) configuration
pub fn to_record(line: &str) -> Result<LogRecord, LogLineError> {
    LineParser::default().to_record(line)
}
