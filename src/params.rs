use std::net::Ipv4Addr;
use std::path::PathBuf;

use chrono::NaiveDateTime;

pub use crate::filter::TimeWindow; // re-export
pub use crate::matching::AddressRange; // re-export
pub use crate::net::Subnet; // re-export

/// Validated parameters for one analysis command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub log_file: PathBuf,
    pub output_file: PathBuf,
    pub start_address: Option<Ipv4Addr>,
    pub prefix_len: Option<u8>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl Parameters {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    /// A start address alone does not restrict anything; only a mask
    /// turns it into a subnet.
    pub fn range(&self) -> AddressRange {
        match (self.start_address, self.prefix_len) {
            (Some(addr), Some(p)) => AddressRange::Within(Subnet::new(addr, p)),
            _ => AddressRange::Any,
        }
    }
}

/// Process-wide settings, from the command line of the binary itself.
#[derive(Debug)]
pub struct Settings {
    // Input:
    pub script: Option<String>,
    // Console:
    pub quiet: bool,
    pub verbosity: u8,
}
