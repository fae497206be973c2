use std::fmt;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::matching::AddressRange;
use crate::record::{LogRecord, prefilter_could_be_record};

/// Inclusive time window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimeWindow { start, end }
    }

    #[inline]
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

/// Lazy filter from raw log lines to the addresses of matching records.
///
/// Lines that do not parse, or whose address is not an IPv4 literal
/// while a range is active, are skipped. Errors from the line source
/// itself are passed through; the caller decides to stop on them.
pub struct AddressFilter<I> {
    lines: I,
    window: TimeWindow,
    range: AddressRange,
    skipped: usize,
}

pub fn filter<I, L, E>(
    lines: I,
    window: TimeWindow,
    range: AddressRange,
) -> AddressFilter<I::IntoIter>
where
    I: IntoIterator<Item = Result<L, E>>,
    L: AsRef<[u8]>,
{
    AddressFilter {
        lines: lines.into_iter(),
        window,
        range,
        skipped: 0,
    }
}

impl<I> AddressFilter<I> {
    /// Number of lines dropped as noise so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> I {
        self.lines
    }

    fn accept(&mut self, line: &[u8]) -> Option<String> {
        if !prefilter_could_be_record(line) {
            self.skipped += 1;
            trace!("skipping log line without a timestamp");
            return None;
        }

        let record = match LogRecord::try_from(line) {
            Ok(r) => r,
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, "skipping unparseable log line");
                return None;
            }
        };

        if !self.window.contains(&record.timestamp) {
            trace!(
                address = %record.address,
                ts = %record.timestamp,
                "outside time window"
            );
            return None;
        }

        match self.range.matches(&record.address) {
            Ok(true) => Some(record.address),
            Ok(false) => None,
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, "skipping log line");
                None
            }
        }
    }
}

impl<I, L, E> Iterator for AddressFilter<I>
where
    I: Iterator<Item = Result<L, E>>,
    L: AsRef<[u8]>,
{
    type Item = Result<String, E>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.next() {
            match line {
                Ok(line) => {
                    if let Some(address) = self.accept(line.as_ref()) {
                        return Some(Ok(address));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
