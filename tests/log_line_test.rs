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

use logline::{
    classify_line, is_log_line, to_record, LineParser, LogLineError, LogRecord, ParserConfig,
    Rejection, RejectionKind, Severity, SeverityPolicy, TimestampError,
};

const STARTED: &str =
    "03/11/21 08:51:01 INFO    :.main: *************** RSVP Agent started ***************\n";

fn compare_record(line: &str, timestamp: &str, log_level: Severity, message: &str) {
    assert!(is_log_line(line), "{:?} should be a log line", line);
    let record = to_record(line).unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(record.timestamp, timestamp);
    assert_eq!(record.log_level, log_level);
    assert_eq!(record.message, message);
}

fn rejected_for(line: &str) -> RejectionKind {
    match classify_line(line) {
        Ok(()) => panic!("{:?} should not be a log line", line),
        Err(reason) => {
            assert!(!is_log_line(line));
            reason.kind()
        }
    }
}

#[test]
fn agent_started() {
    compare_record(
        STARTED,
        "03/11/21 08:51:01",
        Severity::Info,
        ":.main: *************** RSVP Agent started ***************",
    );
}

#[test]
fn record_as_json() {
    let record = to_record(STARTED).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "timestamp": "03/11/21 08:51:01",
            "log_level": "INFO",
            "message": ":.main: *************** RSVP Agent started ***************",
        })
    );
    let back: LogRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn each_known_severity() {
    compare_record(
        "03/11/21 08:51:02 TRACE   :...read_physical_netif: Home list entries returned = 7",
        "03/11/21 08:51:02",
        Severity::Trace,
        ":...read_physical_netif: Home list entries returned = 7",
    );
    compare_record(
        "03/11/21 08:51:02 WARNING :.....mailslot_create: setsockopt(MCAST_ADD) failed\r\n",
        "03/11/21 08:51:02",
        Severity::Warning,
        ":.....mailslot_create: setsockopt(MCAST_ADD) failed",
    );
}

#[test]
fn banner_line() {
    assert_eq!(rejected_for("=== Trace dump ==="), RejectionKind::InvalidTimestamp);
    assert_eq!(rejected_for("=== Trace dump ===\n"), RejectionKind::InvalidTimestamp);
}

#[test]
fn blank_and_continuation_lines() {
    assert_eq!(rejected_for(""), RejectionKind::InvalidTimestamp);
    assert_eq!(rejected_for("\n"), RejectionKind::InvalidTimestamp);
    assert_eq!(
        rejected_for("    at rsvp_agent.reg_process(rsvp_agent.c:412)\n"),
        RejectionKind::InvalidTimestamp
    );
}

#[test]
fn timestamp_only() {
    assert_eq!(rejected_for("03/11/21 08:51:01"), RejectionKind::MissingSeverity);
    assert_eq!(
        classify_line("03/11/21 08:51:01\n"),
        Err(Rejection::MissingDelimiter { found: None })
    );
    assert_eq!(
        classify_line("03/11/21 08:51:01 INFO"),
        Err(Rejection::MissingDelimiter { found: None })
    );
}

#[test]
fn calendar_invalid_timestamp() {
    let line = "13/40/99 25:99:99 INFO    :bad";
    assert_eq!(
        classify_line(line),
        Err(Rejection::InvalidTimestamp(TimestampError::OutOfRange {
            component: "month",
            value: 13,
        }))
    );
    // the shorter form still has a bad timestamp, which is checked first
    assert_eq!(rejected_for("13/40/99 25:99:99 INFO :bad"), RejectionKind::InvalidTimestamp);
}

#[test]
fn empty_message() {
    assert_eq!(rejected_for("03/11/21 08:51:02 INFO    :"), RejectionKind::EmptyMessage);
    assert_eq!(rejected_for("03/11/21 08:51:02 INFO    :\n"), RejectionKind::EmptyMessage);
    assert_eq!(rejected_for("03/11/21 08:51:02 INFO    :\r\n"), RejectionKind::EmptyMessage);
}

#[test]
fn delimiter_must_be_at_column_27() {
    // one space too many pushes the ':' to offset 27
    assert_eq!(
        classify_line("03/11/21 08:51:01 INFO     :.main: started"),
        Err(Rejection::MissingDelimiter { found: Some(' ') })
    );
    assert_eq!(
        classify_line("03/11/21 08:51:03 TRACE   -...rsvp_api_open: missing delimiter"),
        Err(Rejection::MissingDelimiter { found: Some('-') })
    );
}

#[test]
fn short_lines_are_never_log_lines() {
    let full = STARTED.trim_end();
    for end in 0..27 {
        let prefix: String = full.chars().take(end).collect();
        assert!(!is_log_line(&prefix), "{:?} is too short to be a log line", prefix);
    }
    let shortest: String = full.chars().take(28).collect();
    assert!(is_log_line(&shortest));
}

#[test]
fn garbage_after_a_bad_timestamp_does_not_matter() {
    let tails = vec!["", " INFO    :.main: started", " WARNING :x", "xxxxxxxxx:yyy"];
    for tail in tails {
        let line = format!("99/99/99 99:99:99{}", tail);
        assert!(!is_log_line(&line), "{:?} should be rejected", line);
    }
}

#[test]
fn accepted_lines_have_the_delimiter_at_26() {
    let lines = vec![
        STARTED,
        "03/11/21 08:51:02 TRACE   :x",
        "12/31/99 23:59:59 WARNING : spaced message ",
        "03/11/21 08:51:02 TRACE   :ünïcödé",
    ];
    for line in lines {
        assert!(is_log_line(line));
        assert_eq!(line.chars().nth(26), Some(':'));
        assert!(to_record(line).is_ok());
    }
}

#[test]
fn multibyte_characters_count_as_one() {
    // "é" is two bytes but one character, which keeps the ':' at character 26
    let line = "03/11/21 08:51:02 é       :accented severity field";
    assert!(is_log_line(line));
    let record = to_record(line).unwrap();
    assert_eq!(record.log_level, Severity::Unknown("é".to_string()));
    assert_eq!(record.message, ":accented severity field");
}

#[test]
fn unknown_severity_is_kept_by_default() {
    let line = "03/11/21 08:51:02 DEBUG   :...rsvp_flow_stateMachine: state RESVED";
    let record = to_record(line).unwrap();
    assert_eq!(record.log_level, Severity::Unknown("DEBUG".to_string()));
    assert!(!record.log_level.is_known());
    assert_eq!(LineParser::default().to_record(line).unwrap(), record);

    let blank = "03/11/21 08:51:02         :no severity at all";
    let record = to_record(blank).unwrap();
    assert_eq!(record.log_level.as_str(), "");
}

#[test]
fn unknown_severity_is_rejected_when_strict() {
    let line = "03/11/21 08:51:02 DEBUG   :...rsvp_flow_stateMachine: state RESVED";
    assert!(is_log_line(line));
    assert_eq!(
        LineParser::strict().to_record(line),
        Err(LogLineError::MalformedSeverity {
            token: "DEBUG".to_string(),
            line: line.to_string(),
        })
    );
    let blank = "03/11/21 08:51:02         :no severity at all";
    assert!(LineParser::strict().to_record(blank).is_err());
    assert!(LineParser::strict().to_record(STARTED).is_ok());
}

#[test]
fn every_accepted_line_extracts() {
    let lines = vec![
        STARTED,
        "03/11/21 08:51:02 TRACE   :x",
        "12/31/99 23:59:59 WARNING : spaced message ",
        "03/11/21 08:51:02 DEBUG   :x",
        "03/11/21 08:51:02         :no severity at all",
        "03/11/21 08:51:02ABCDEFGHI:msg",
        "03/11/21 08:51:02 é       :accented severity field",
        "03/11/21 08:51:02 info    :lowercase\r\n",
        "=== Trace dump ===",
        "03/11/21 08:51:02 INFO    :",
    ];
    for line in lines {
        if is_log_line(line) {
            assert!(to_record(line).is_ok(), "{:?} was accepted but didn't extract", line);
        } else {
            assert!(to_record(line).is_err(), "{:?} was rejected but extracted", line);
        }
    }
}

#[test]
fn severity_is_case_sensitive() {
    assert_eq!(Severity::parse("INFO"), Severity::Info);
    assert_eq!(Severity::parse("info"), Severity::Unknown("info".to_string()));
    assert_eq!(Severity::parse("Warning").as_str(), "Warning");
}

#[test]
fn extracting_a_rejected_line_fails() {
    let lines = vec![
        ("=== Trace dump ===\n", RejectionKind::InvalidTimestamp),
        ("03/11/21 08:51:01", RejectionKind::MissingSeverity),
        ("03/11/21 08:51:02 INFO    :", RejectionKind::EmptyMessage),
    ];
    for (line, kind) in lines {
        for parser in [LineParser::default(), LineParser::strict()] {
            match parser.to_record(line) {
                Err(LogLineError::InvalidLogLine { reason, line: l }) => {
                    assert_eq!(reason.kind(), kind);
                    assert_eq!(l, line);
                }
                other => panic!("{:?} should not produce a record, got {:?}", line, other),
            }
        }
    }
}

#[test]
fn extraction_is_repeatable() {
    let first = to_record(STARTED).unwrap();
    let second = to_record(STARTED).unwrap();
    assert_eq!(first, second);
}

#[test]
fn record_display_is_a_log_line() {
    let record = to_record(STARTED).unwrap();
    let line = record.to_string();
    assert_eq!(line, STARTED.trim_end());
    assert_eq!(to_record(&line).unwrap(), record);
}

#[test]
fn full_width_severity_display_is_a_log_line() {
    let line = "03/11/21 08:51:02ABCDEFGHI:msg";
    let record = to_record(line).unwrap();
    assert_eq!(record.log_level, Severity::Unknown("ABCDEFGHI".to_string()));
    let written = record.to_string();
    assert_eq!(written, line);
    assert!(is_log_line(&written));
    assert_eq!(to_record(&written).unwrap(), record);

    let unknown = to_record("03/11/21 08:51:02 DEBUG   :x").unwrap();
    assert_eq!(unknown.to_string(), "03/11/21 08:51:02 DEBUG   :x");
}

#[test]
fn record_datetime() {
    let record = to_record(STARTED).unwrap();
    let dt = record.datetime().unwrap();
    assert_eq!(dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "2021-03-11T08:51:01");
}

#[test]
fn config_from_json() {
    let config: ParserConfig = serde_json::from_str(r#"{"severity": "strict"}"#).unwrap();
    assert_eq!(config.severity, SeverityPolicy::Strict);
    assert_eq!(LineParser::new(config), LineParser::strict());
    let config: ParserConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ParserConfig::default());
    assert_eq!(config.severity, SeverityPolicy::Lenient);
    assert_eq!(LineParser::new(config).config(), &config);
}

#[test]
fn error_messages() {
    let err = to_record("=== Trace dump ===\n").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("invalid log line (malformed timestamp"), "{}", message);
    assert!(message.ends_with("\"=== Trace dump ===\""), "{}", message);
}
