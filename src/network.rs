// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network prefix value object
//!
//! Node and destination prefixes arrive as strings from cluster resources and
//! from the inventory. [`CidrPrefix`] parses them once, normalises the host
//! bits away and answers containment questions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Prefix parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),
}

/// An IPv4 or IPv6 network in CIDR notation.
///
/// Invariants:
/// - prefix length is within the address family's range
/// - host bits are zeroed, so `10.250.1.7/19` and `10.250.0.0/19` compare equal
///
/// # Examples
///
/// ```rust
/// use metal_provider_core::network::CidrPrefix;
///
/// let node = CidrPrefix::new("10.250.0.0/19").unwrap();
/// let super_net = CidrPrefix::new("10.0.0.0/8").unwrap();
/// assert!(super_net.is_strict_superset_of(&node));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrPrefix {
    network: IpAddr,
    prefix_length: u8,
}

impl CidrPrefix {
    /// Parse a prefix such as `10.250.0.0/19`.
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix length
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > max_prefix(&address) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            network: mask(address, prefix_length),
            prefix_length,
        })
    }

    /// The network address (host bits cleared)
    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self.network, IpAddr::V4(_))
    }

    /// Whether every address of `other` lies inside `self`.
    ///
    /// Prefixes of different address families never contain each other.
    pub fn contains(&self, other: &CidrPrefix) -> bool {
        if self.is_ipv4() != other.is_ipv4() || self.prefix_length > other.prefix_length {
            return false;
        }
        mask(other.network, self.prefix_length) == self.network
    }

    /// `self` contains `other` and is strictly larger than it.
    pub fn is_strict_superset_of(&self, other: &CidrPrefix) -> bool {
        self.prefix_length < other.prefix_length && self.contains(other)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.network, self.prefix_length)
    }
}

fn max_prefix(address: &IpAddr) -> u8 {
    match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(address: IpAddr, prefix_length: u8) -> IpAddr {
    match address {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let masked = match prefix_length {
                0 => 0,
                n => bits & (u32::MAX << (32 - u32::from(n))),
            };
            IpAddr::V4(masked.into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let masked = match prefix_length {
                0 => 0,
                n => bits & (u128::MAX << (128 - u32::from(n))),
            };
            IpAddr::V6(masked.into())
        }
    }
}

impl fmt::Display for CidrPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for CidrPrefix {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrPrefix {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrPrefix> for String {
    fn from(value: CidrPrefix) -> Self {
        value.as_cidr()
    }
}
