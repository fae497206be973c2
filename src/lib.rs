pub mod cli;
pub mod command;
pub mod core;
pub mod filter;
pub mod logging;
pub mod matching;
pub mod params;
pub mod record;
pub mod tally;

mod files;
mod net;
mod output;

pub use crate::files::{LogLines, LogSourceError, OutputSinkError}; // re-export
pub use crate::net::{AddressParseError, netmask}; // re-export
