use std::fmt;
use std::net::Ipv4Addr;

pub use ipnet::Ipv4Net; // re-export

pub const MAX_PREFIX_LEN: u8 = 32;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("invalid IPv4 address: {0}")]
    NotAnIpv4(String),
}

/// Parse a dotted-quad. Surrounding whitespace is not accepted.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, AddressParseError> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| AddressParseError::NotAnIpv4(s.to_string()))
}

/// Build the 4-byte network mask for a prefix length, one byte at a
/// time. Anything above 32 yields the all-ones mask.
pub fn netmask(prefix_len: u8) -> [u8; 4] {
    let mut remaining = prefix_len.min(MAX_PREFIX_LEN);
    let mut mask = [0u8; 4];
    for byte in mask.iter_mut() {
        if remaining >= 8 {
            *byte = 0xff;
            remaining -= 8;
        } else if remaining > 0 {
            *byte = 0xff << (8 - remaining);
            remaining = 0;
        }
    }
    mask
}

#[inline]
pub fn apply_mask(addr: Ipv4Addr, mask: [u8; 4]) -> [u8; 4] {
    let octets = addr.octets();
    std::array::from_fn(|i| octets[i] & mask[i])
}

/// A reference address plus prefix length. Host bits in the reference
/// are allowed; they are masked away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subnet {
    net: Ipv4Net,
    mask: [u8; 4],
    network: [u8; 4],
}

impl Subnet {
    pub fn new(reference: Ipv4Addr, prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(MAX_PREFIX_LEN);
        let mask = netmask(prefix_len);
        Subnet {
            net: Ipv4Net::new(reference, prefix_len)
                .expect("prefix length clamped to 32"),
            mask,
            network: apply_mask(reference, mask),
        }
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    pub fn network(&self) -> [u8; 4] {
        self.network
    }

    pub fn has_host_bits(&self) -> bool {
        self.net.network() != self.net.addr()
    }

    #[inline]
    pub fn contains(&self, candidate: Ipv4Addr) -> bool {
        apply_mask(candidate, self.mask) == self.network
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net.trunc())
    }
}
