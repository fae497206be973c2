use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::net::{MAX_PREFIX_LEN, parse_ipv4};
use crate::params::Parameters;
use crate::record::has_shape;

pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Number of tokens in a complete command: six flag/value pairs.
pub const COMMAND_TOKENS: usize = 12;

pub const USAGE: &str = "\
Invalid command. \n\
Usage: --file-log <log_file_path> \
--file-output <output_file_path> \
--address-start <start_ip> \
--address-mask <mask> \
--time-start <start_time> \
--time-end <end_time>";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    FileLog,
    FileOutput,
    AddressStart,
    AddressMask,
    TimeStart,
    TimeEnd,
}

impl Flag {
    pub fn lookup(token: &str) -> Option<Flag> {
        match token {
            "--file-log" => Some(Flag::FileLog),
            "--file-output" => Some(Flag::FileOutput),
            "--address-start" => Some(Flag::AddressStart),
            "--address-mask" => Some(Flag::AddressMask),
            "--time-start" => Some(Flag::TimeStart),
            "--time-end" => Some(Flag::TimeEnd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::FileLog => "--file-log",
            Flag::FileOutput => "--file-output",
            Flag::AddressStart => "--address-start",
            Flag::AddressMask => "--address-mask",
            Flag::TimeStart => "--time-start",
            Flag::TimeEnd => "--time-end",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required argument: {0}")]
    MissingFlag(Flag),
    #[error("missing value for argument: {0}")]
    MissingValue(String),
    #[error("{0}: invalid mask '{1}', expected an integer")]
    InvalidMask(Flag, String),
    #[error("{0}: mask {1} out of range, expected 0..=32")]
    MaskOutOfRange(Flag, i64),
    #[error("{0}: invalid IPv4 address '{1}'")]
    InvalidAddress(Flag, String),
    #[error("{0}: invalid date '{1}', expected dd.MM.yyyy")]
    InvalidDate(Flag, String),
    #[error("--time-start {0} is after --time-end {1}")]
    StartAfterEnd(NaiveDate, NaiveDate),
}

#[derive(Default)]
struct Collected {
    log_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    start_address: Option<Ipv4Addr>,
    prefix_len: Option<u8>,
    start_time: Option<NaiveDate>,
    end_time: Option<NaiveDate>,
}

/// Flag positions holding something that is not a known flag. These
/// are reported to the user but do not fail the command by themselves.
pub fn unknown_flags<S: AsRef<str>>(tokens: &[S]) -> Vec<&str> {
    tokens
        .iter()
        .step_by(2)
        .map(|t| t.as_ref())
        .filter(|t| Flag::lookup(t).is_none())
        .collect()
}

/// Parse `--flag value` pairs. Later duplicates override earlier ones
/// and unknown flags are skipped. The token count itself is the
/// caller's business; an odd trailing token is reported as a flag
/// without a value.
pub fn parse_tokens<S: AsRef<str>>(
    tokens: &[S],
) -> Result<Parameters, ValidationError> {
    let mut c = Collected::default();

    for pair in tokens.chunks(2) {
        let name = pair[0].as_ref();
        let Some(value) = pair.get(1).map(|v| v.as_ref()) else {
            return Err(ValidationError::MissingValue(name.to_string()));
        };
        let Some(flag) = Flag::lookup(name) else {
            continue;
        };
        match flag {
            Flag::FileLog => c.log_file = Some(PathBuf::from(value)),
            Flag::FileOutput => c.output_file = Some(PathBuf::from(value)),
            Flag::AddressStart => {
                c.start_address = Some(
                    parse_ipv4(value).map_err(|_| {
                        ValidationError::InvalidAddress(flag, value.to_string())
                    })?,
                )
            }
            Flag::AddressMask => c.prefix_len = Some(parse_mask(flag, value)?),
            Flag::TimeStart | Flag::TimeEnd => {
                let date = parse_date(flag, value)?;
                match flag {
                    Flag::TimeStart => c.start_time = Some(date),
                    _ => c.end_time = Some(date),
                }
            }
        }
    }

    c.finish()
}

impl Collected {
    fn finish(self) -> Result<Parameters, ValidationError> {
        use ValidationError::{MissingFlag, StartAfterEnd};

        // All six are required; an unknown flag in a 12-token command
        // always displaces one of them.
        let log_file = self.log_file.ok_or(MissingFlag(Flag::FileLog))?;
        let output_file =
            self.output_file.ok_or(MissingFlag(Flag::FileOutput))?;
        let start_address =
            self.start_address.ok_or(MissingFlag(Flag::AddressStart))?;
        let prefix_len =
            self.prefix_len.ok_or(MissingFlag(Flag::AddressMask))?;
        let start = self.start_time.ok_or(MissingFlag(Flag::TimeStart))?;
        let end = self.end_time.ok_or(MissingFlag(Flag::TimeEnd))?;

        if start > end {
            return Err(StartAfterEnd(start, end));
        }

        Ok(Parameters {
            log_file,
            output_file,
            start_address: Some(start_address),
            prefix_len: Some(prefix_len),
            start_time: midnight(start),
            end_time: midnight(end),
        })
    }
}

fn parse_mask(flag: Flag, value: &str) -> Result<u8, ValidationError> {
    let n: i64 = value
        .parse()
        .map_err(|_| ValidationError::InvalidMask(flag, value.to_string()))?;
    match u8::try_from(n) {
        Ok(p) if p <= MAX_PREFIX_LEN => Ok(p),
        _ => Err(ValidationError::MaskOutOfRange(flag, n)),
    }
}

fn parse_date(flag: Flag, value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(flag, value.to_string());
    if !has_shape(value, b"dd.dd.dddd") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}
