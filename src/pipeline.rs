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

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

use crate::errors::{LogLineError, Rejection, RejectionKind};
use crate::log_line::{classify_line, LineParser, LogRecord};

/// Reads lines one at a time, keeping each line's terminator
pub struct RawLines<R> {
    reader: R,
}

impl<R: BufRead> RawLines<R> {
    pub fn new(reader: R) -> Self {
        RawLines { reader }
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Opens a log file as a [`RawLines`] source
pub fn open_log_file(path: impl AsRef<Path>) -> io::Result<RawLines<BufReader<File>>> {
    Ok(RawLines::new(BufReader::new(File::open(path)?)))
}

/// Passes through the lines that are log lines, untouched
pub struct LogLines<I> {
    inner: I,
}

impl<I> Iterator for LogLines<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.inner.by_ref() {
            match classify_line(line.as_ref()) {
                Ok(()) => {
                    trace!(line = line.as_ref().trim_end(), "accepted log line");
                    return Some(line);
                }
                Err(reason) => {
                    debug!(%reason, line = line.as_ref().trim_end(), "skipping line");
                }
            }
        }
        None
    }
}

/// Turns the log lines of a sequence into records. Lines that aren't log lines are
/// dropped before extraction, so the only errors are the parser's severity checks.
pub struct LogRecords<I> {
    lines: LogLines<I>,
    parser: LineParser,
}

impl<I> Iterator for LogRecords<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<LogRecord, LogLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(self.parser.to_record(line.as_ref()))
    }
}

/// Lazy log-line adapters for any sequence of lines
pub trait LogLineIteratorExt: Iterator + Sized
where
    Self::Item: AsRef<str>,
{
    fn log_lines(self) -> LogLines<Self> {
        LogLines { inner: self }
    }

    fn log_records(self, parser: LineParser) -> LogRecords<Self> {
        LogRecords {
            lines: self.log_lines(),
            parser,
        }
    }
}

impl<I> LogLineIteratorExt for I
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

/// Counts of accepted lines and of rejected lines by reason
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub accepted: usize,
    pub rejected: BTreeMap<RejectionKind, usize>,
}

impl ScanSummary {
    /// Classifies every line of `lines` and tallies the outcomes
    pub fn scan<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        lines.into_iter().fold(ScanSummary::default(), |mut summary, line| {
            summary.record(&classify_line(line.as_ref()));
            summary
        })
    }

    pub fn record(&mut self, outcome: &Result<(), Rejection>) {
        match outcome {
            Ok(()) => self.accepted += 1,
            Err(reason) => *self.rejected.entry(reason.kind()).or_insert(0) += 1,
        }
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected_total()
    }
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "lines:    {}", self.total())?;
        writeln!(f, "accepted: {}", self.accepted)?;
        writeln!(f, "rejected: {}", self.rejected_total())?;
        for (kind, count) in self.rejected.iter() {
            writeln!(f, "  {:<18}{}", kind, count)?;
        }
        Ok(())
    }
}
