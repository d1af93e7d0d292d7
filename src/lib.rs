mod errors;
mod log_line;
mod pipeline;
mod timestamp;

pub use errors::{pretty_print_error, LogLineError, Rejection, RejectionKind, TimestampError};
pub use log_line::{
    classify_line, is_log_line, to_record, LineParser, LogRecord, ParserConfig, Severity,
    SeverityPolicy, DELIMITER, MESSAGE_OFFSET,
};
pub use pipeline::{open_log_file, LogLineIteratorExt, LogLines, LogRecords, RawLines, ScanSummary};
pub use timestamp::{is_valid_timestamp, parse_timestamp, TIMESTAMP_WIDTH};
