use std::str::from_utf8;

use chrono::NaiveDateTime;
use memchr::memchr_iter;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid utf-8")]
    InvalidUtf8,
    #[error("expected <address> <date> <time>, got {0} field(s)")]
    TooFewFields(usize),
    #[error("invalid timestamp: {0}")]
    BadTimestamp(String),
}

/// One access log entry. The address is kept verbatim; it is only
/// validated when an address range is in effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub address: String,
    pub timestamp: NaiveDateTime,
}

impl TryFrom<&str> for LogRecord {
    type Error = ParseError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let mut fields = line.split_whitespace();
        let (address, date, time) =
            match (fields.next(), fields.next(), fields.next()) {
                (Some(a), Some(d), Some(t)) => (a, d, t),
                (a, d, _) => {
                    let n = [a, d].iter().filter(|f| f.is_some()).count();
                    return Err(ParseError::TooFewFields(n));
                }
            };

        let stamp = format!("{date} {time}");
        if !has_shape(date, b"dddd-dd-dd") || !has_shape(time, b"dd:dd:dd") {
            return Err(ParseError::BadTimestamp(stamp));
        }
        let timestamp = NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseError::BadTimestamp(stamp.clone()))?;

        Ok(LogRecord {
            address: address.to_string(),
            timestamp,
        })
    }
}

impl TryFrom<&[u8]> for LogRecord {
    type Error = ParseError;

    fn try_from(line: &[u8]) -> Result<Self, Self::Error> {
        let s = from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;
        LogRecord::try_from(s)
    }
}

/// Check `value` against a template where 'd' stands for an ASCII digit
/// and every other byte must match literally.
pub fn has_shape(value: &str, template: &[u8]) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == template.len()
        && bytes.iter().zip(template).all(|(&b, &t)| match t {
            b'd' => b.is_ascii_digit(),
            _ => b == t,
        })
}

/// Quick check for "[0-9]-[0-9]" followed somewhere by "[0-9]:[0-9]".
/// Lines without both cannot hold a timestamp, so they are rejected
/// before any tokenising or allocation happens.
#[inline]
pub fn prefilter_could_be_record(line: &[u8]) -> bool {
    if line.len() < 3 {
        return false;
    }

    let maxpos = line.len() - 1;
    let digits_around = |pos: usize| {
        pos > 0
            && pos < maxpos
            && line[pos - 1].is_ascii_digit()
            && line[pos + 1].is_ascii_digit()
    };

    let Some(dash) = memchr_iter(b'-', line).find(|&pos| digits_around(pos))
    else {
        return false;
    };
    memchr_iter(b':', &line[dash..]).any(|pos| digits_around(dash + pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let r = LogRecord::try_from("192.168.1.5 2023-01-10 08:00:00").unwrap();
        assert_eq!(r.address, "192.168.1.5");
        assert_eq!(r.timestamp, at(2023, 1, 10, 8, 0, 0));
    }

    #[test]
    fn test_parse_extra_whitespace_and_trailing_fields() {
        let r = LogRecord::try_from(
            "  10.0.0.1\t2024-02-29   23:59:59 GET /index.html\r\n",
        )
        .unwrap();
        assert_eq!(r.address, "10.0.0.1");
        assert_eq!(r.timestamp, at(2024, 2, 29, 23, 59, 59));
    }

    #[test]
    fn test_address_is_not_validated() {
        let r = LogRecord::try_from("999.1.1.1 2023-01-10 08:00:00").unwrap();
        assert_eq!(r.address, "999.1.1.1");
    }

    #[test]
    fn test_too_few_fields() {
        let cases: &[(&str, usize)] = &[
            ("", 0),
            ("   ", 0),
            ("10.0.0.1", 1),
            ("10.0.0.1 2023-01-10", 2),
            ("not-an-ip garbage-timestamp", 2),
        ];
        for &(line, n) in cases {
            assert_eq!(
                LogRecord::try_from(line),
                Err(ParseError::TooFewFields(n)),
                "line={line:?}"
            );
        }
    }

    #[test]
    fn test_bad_timestamps() {
        let cases = [
            "1.2.3.4 2023-1-10 08:00:00",   // one-digit month
            "1.2.3.4 2023-01-10 8:00:00",   // one-digit hour
            "1.2.3.4 23-01-10 08:00:00",    // two-digit year
            "1.2.3.4 2023-13-10 08:00:00",  // month 13
            "1.2.3.4 2023-00-10 08:00:00",  // month 0
            "1.2.3.4 2023-02-30 08:00:00",  // no such day
            "1.2.3.4 2023-01-10 24:00:00",  // 24-hour clock ends at 23
            "1.2.3.4 2023/01/10 08:00:00",  // wrong separators
            "1.2.3.4 2023-01-10 08:00",     // missing seconds
            "1.2.3.4 10.01.2023 08:00:00",  // command-line date format
            "1.2.3.4 2023-01-10T08:00:00 x", // ISO 8601
        ];
        for line in cases {
            assert!(
                matches!(
                    LogRecord::try_from(line),
                    Err(ParseError::BadTimestamp(_))
                ),
                "line={line:?}"
            );
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let line: &[u8] = b"1.2.3.4 \xff2023-01-10 08:00:00";
        assert_eq!(LogRecord::try_from(line), Err(ParseError::InvalidUtf8));
    }

    #[test]
    fn test_has_shape() {
        assert!(has_shape("2023-01-10", b"dddd-dd-dd"));
        assert!(has_shape("08:00:00", b"dd:dd:dd"));
        assert!(has_shape("10.01.2023", b"dd.dd.dddd"));
        assert!(!has_shape("2023-1-10", b"dddd-dd-dd"));
        assert!(!has_shape("2023-01-10 ", b"dddd-dd-dd"));
        assert!(!has_shape("2023_01_10", b"dddd-dd-dd"));
        assert!(!has_shape("２023-01-10", b"dddd-dd-dd"));
    }

    #[test]
    fn test_prefilter() {
        let cases: &[(&[u8], bool)] = &[
            (b"192.168.1.5 2023-01-10 08:00:00", true),
            (b"192.168.1.5 2023-01-10 08:00:00\n", true),
            (b"1-2:3", true),
            (b"not-an-ip garbage-timestamp", false),
            (b"08:00:00 2023-01-10", false), // time before date
            (b"", false),
            (b"-:", false),
            (b"1.2.3.4 - - [10/Jan/2023:08:00:00]", false),
        ];
        for &(line, expected) in cases {
            assert_eq!(
                prefilter_could_be_record(line),
                expected,
                "line={:?}",
                std::str::from_utf8(line).unwrap()
            );
        }
    }

    #[test]
    fn test_prefilter_accepts_everything_parse_accepts() {
        let lines = [
            "192.168.1.5 2023-01-10 08:00:00",
            "x 0000-01-01 00:00:00",
            "  10.0.0.1\t2024-02-29   23:59:59 GET /",
        ];
        for line in lines {
            assert!(LogRecord::try_from(line).is_ok(), "{line}");
            assert!(prefilter_could_be_record(line.as_bytes()), "{line}");
        }
    }
}
