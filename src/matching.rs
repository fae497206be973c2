use std::fmt;

use crate::net::{AddressParseError, Subnet, parse_ipv4};

/// Address predicate for a single command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressRange {
    /// No mask given; every address passes, even unparseable ones.
    #[default]
    Any,
    Within(Subnet),
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRange::Any => write!(f, "any"),
            AddressRange::Within(subnet) => write!(f, "{subnet}"),
        }
    }
}

impl AddressRange {
    pub fn matches(&self, candidate: &str) -> Result<bool, AddressParseError> {
        match self {
            AddressRange::Any => Ok(true),
            AddressRange::Within(subnet) => {
                Ok(subnet.contains(parse_ipv4(candidate)?))
            }
        }
    }
}

/// Decide whether `candidate` lies in the subnet implied by `reference`
/// and `prefix_len`. Without a prefix length nothing is parsed and the
/// answer is always yes.
pub fn in_range(
    candidate: &str,
    reference: &str,
    prefix_len: Option<u8>,
) -> Result<bool, AddressParseError> {
    let range = match prefix_len {
        None => AddressRange::Any,
        Some(p) => AddressRange::Within(Subnet::new(parse_ipv4(reference)?, p)),
    };
    range.matches(candidate)
}
