use anyhow::{bail, Context, Result};
use logline::{
    LineParser, LogLineIteratorExt, ParserConfig, RawLines, ScanSummary, SeverityPolicy,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
    str::FromStr,
};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Echo the log lines unchanged
    Lines,
    /// One JSON record per log line
    Records,
    /// Accepted/rejected counts
    Summary,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(Mode::Lines),
            "records" => Ok(Mode::Records),
            "summary" => Ok(Mode::Summary),
            other => Err(format!(
                "unknown mode {:?}, expected lines, records or summary",
                other
            )),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "logline_checker",
    about = "Picks the well-formed log lines out of a log file"
)]
struct LogLineChecker {
    /// Log file to read. Reads stdin when omitted.
    #[structopt(long, short, parse(from_os_str))]
    log_file: Option<PathBuf>,
    /// lines, records or summary
    #[structopt(long, short, default_value = "records")]
    mode: Mode,
    /// Fail on severities other than INFO, TRACE and WARNING
    #[structopt(long)]
    strict: bool,
    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG overrides this.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let LogLineChecker {
        log_file,
        mode,
        strict,
        verbose,
    } = LogLineChecker::from_args();
    init_tracing(verbose);

    let config = ParserConfig {
        severity: if strict {
            SeverityPolicy::Strict
        } else {
            SeverityPolicy::Lenient
        },
    };
    let source_name = match &log_file {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    };
    let reader: Box<dyn BufRead> = match &log_file {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Could not read file {}", source_name))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    // Stop at the first read error and report it once the output is flushed
    let mut read_error: Option<io::Error> = None;
    let lines = RawLines::new(reader).map_while(|line| match line {
        Ok(line) => Some(line),
        Err(e) => {
            read_error = Some(e);
            None
        }
    });

    let mut out = BufWriter::new(io::stdout().lock());
    match mode {
        Mode::Lines => {
            let mut emitted = 0usize;
            for line in lines.log_lines() {
                out.write_all(line.as_bytes())?;
                emitted += 1;
            }
            info!(source = %source_name, emitted, "finished filtering");
        }
        Mode::Records => {
            let mut emitted = 0usize;
            for record in lines.log_records(LineParser::new(config)) {
                let record = record.with_context(|| format!("Could not parse {}", source_name))?;
                serde_json::to_writer(&mut out, &record)?;
                writeln!(out)?;
                emitted += 1;
            }
            info!(source = %source_name, emitted, "finished extracting records");
        }
        Mode::Summary => {
            let summary = ScanSummary::scan(lines);
            write!(out, "{}", summary)?;
            info!(source = %source_name, accepted = summary.accepted, "finished scan");
        }
    }
    out.flush()?;

    if let Some(e) = read_error {
        bail!("Could not read {}. Error: {}", source_name, e);
    }
    Ok(())
}
