//! IPv4 arithmetic for dhcp-range computation.
//!
//! Parsing is permissive in the same way as a non-strict network: host bits
//! in the interface address are masked off, not rejected. Offsets are plain
//! integer addition over the 32-bit address space; the result is NOT checked
//! against the subnet.

use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    #[error("invalid netmask '{0}'")]
    InvalidNetmask(String),

    #[error("{base} + {offset} is outside the IPv4 address space")]
    OutOfRange { base: Ipv4Addr, offset: i64 },
}

/// Parse a netmask given as a dotted quad (`255.255.255.0`) or a prefix
/// length (`24`) into its 32-bit mask.
pub fn parse_netmask(netmask: &str) -> Result<u32, AddressError> {
    let invalid = || AddressError::InvalidNetmask(netmask.to_string());
    let trimmed = netmask.trim();

    if let Ok(prefix) = trimmed.parse::<u8>() {
        return match prefix {
            0 => Ok(0),
            1..=32 => Ok(u32::MAX << (32 - prefix)),
            _ => Err(invalid()),
        };
    }

    let mask = u32::from(trimmed.parse::<Ipv4Addr>().map_err(|_| invalid())?);
    // Contiguous ones followed by contiguous zeros.
    if mask.leading_ones() + mask.trailing_zeros() != 32 {
        return Err(invalid());
    }
    Ok(mask)
}

/// Network address of `ipaddr` under `netmask`.
pub fn network_address(ipaddr: &str, netmask: &str) -> Result<Ipv4Addr, AddressError> {
    let addr = ipaddr
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| AddressError::InvalidAddress(ipaddr.to_string()))?;
    let mask = parse_netmask(netmask)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// `base + offset`, failing only when the result leaves the address space.
pub fn offset(base: Ipv4Addr, offset: i64) -> Result<Ipv4Addr, AddressError> {
    let value = i64::from(u32::from(base)) + offset;
    u32::try_from(value)
        .map(Ipv4Addr::from)
        .map_err(|_| AddressError::OutOfRange { base, offset })
}
