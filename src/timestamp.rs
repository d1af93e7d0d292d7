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

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map_res};
use nom::error::{context, VerboseError};
use nom::sequence::{preceded, tuple};
use nom::IResult;

use crate::errors::{pretty_print_error, TimestampError};

/// Number of characters in a `MM/DD/YY HH:MM:SS` timestamp
pub const TIMESTAMP_WIDTH: usize = 17;

type Res<T, U> = IResult<T, U, VerboseError<T>>;

/// The six numeric components of a timestamp, before any range checks
#[derive(Debug, PartialEq, Eq)]
struct Fields {
    month: u32,
    day: u32,
    year: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

/// Returns true if `candidate` is exactly a real `MM/DD/YY HH:MM:SS` timestamp
pub fn is_valid_timestamp(candidate: &str) -> bool {
    parse_timestamp(candidate).is_ok()
}

/// Parses a `MM/DD/YY HH:MM:SS` timestamp into a calendar value.
///
/// The shape is checked first (two ASCII digits per field, `/` and `:` separators,
/// a single space between date and time, nothing left over), then every component is
/// range-checked against the calendar. Two-digit years follow the POSIX `%y` pivot:
/// `69`-`99` are 1969-1999 and `00`-`68` are 2000-2068.
pub fn parse_timestamp(candidate: &str) -> Result<NaiveDateTime, TimestampError> {
    let fields = match all_consuming(timestamp_fields)(candidate) {
        Ok((_, fields)) => fields,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(TimestampError::Shape {
                candidate: candidate.to_string(),
                detail: pretty_print_error(candidate, e),
            })
        }
        Err(e) => {
            return Err(TimestampError::Shape {
                candidate: candidate.to_string(),
                detail: e.to_string(),
            })
        }
    };
    to_datetime(fields)
}

fn to_datetime(fields: Fields) -> Result<NaiveDateTime, TimestampError> {
    let Fields {
        month,
        day,
        year,
        hour,
        minute,
        second,
    } = fields;

    if !(1..=12).contains(&month) {
        return Err(out_of_range("month", month));
    }
    let full_year = if year >= 69 { 1900 + year } else { 2000 + year };
    // month is in range, so a miss here can only be the day
    let date = NaiveDate::from_ymd_opt(full_year as i32, month, day)
        .ok_or_else(|| out_of_range("day", day))?;

    if hour > 23 {
        return Err(out_of_range("hour", hour));
    }
    if minute > 59 {
        return Err(out_of_range("minute", minute));
    }
    if second > 59 {
        return Err(out_of_range("second", second));
    }
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| out_of_range("second", second))?;

    Ok(NaiveDateTime::new(date, time))
}

fn out_of_range(component: &'static str, value: u32) -> TimestampError {
    TimestampError::OutOfRange { component, value }
}

/// Exactly two ASCII digits
fn two_digits(input: &str) -> Res<&str, u32> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        |digits: &str| digits.parse::<u32>(),
    )(input)
}

/// `MM/DD/YY`
fn date(input: &str) -> Res<&str, (u32, u32, u32)> {
    tuple((
        context("month", two_digits),
        preceded(char('/'), context("day", two_digits)),
        preceded(char('/'), context("year", two_digits)),
    ))(input)
}

/// `HH:MM:SS`
fn time(input: &str) -> Res<&str, (u32, u32, u32)> {
    tuple((
        context("hour", two_digits),
        preceded(char(':'), context("minute", two_digits)),
        preceded(char(':'), context("second", two_digits)),
    ))(input)
}

fn timestamp_fields(input: &str) -> Res<&str, Fields> {
    let (rest, ((month, day, year), _, (hour, minute, second))) = context(
        "timestamp",
        tuple((context("date", date), char(' '), context("time", time))),
    )(input)?;
    Ok((
        rest,
        Fields {
            month,
            day,
            year,
            hour,
            minute,
            second,
        },
    ))
}
