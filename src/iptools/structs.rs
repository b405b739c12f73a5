// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    addresses::parse_range, collapsing::cidr_to_range, strings::*, AddressError, IPV4_BITS,
    IPV4_BYTES, IPV6_BITS, IPV6_BYTES,
};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

/// IP address family
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum IpFam {
    V4,
    V6,
}

impl IpFam {
    #[inline]
    pub fn of(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpFam::V4,
            IpAddr::V6(_) => IpFam::V6,
        }
    }

    #[inline]
    pub fn bits(&self) -> u8 {
        match self {
            IpFam::V4 => IPV4_BITS,
            IpFam::V6 => IPV6_BITS,
        }
    }

    /// Address width in bytes; doubles as the version tag of the binary layout.
    #[inline]
    pub fn byte_count(&self) -> usize {
        match self {
            IpFam::V4 => IPV4_BYTES,
            IpFam::V6 => IPV6_BYTES,
        }
    }

    /// Largest numeric address value in this family.
    #[inline]
    pub fn max_value(&self) -> u128 {
        match self {
            IpFam::V4 => u32::MAX as u128,
            IpFam::V6 => u128::MAX,
        }
    }
}

/* ---------------------------------- */

/// Numeric value of an address within its own family.
#[inline]
pub fn ip_to_int(ip: IpAddr) -> u128 {
    match ip {
        IpAddr::V4(a) => u32::from_be_bytes(a.octets()) as u128,
        IpAddr::V6(a) => u128::from_be_bytes(a.octets()),
    }
}

#[inline]
pub fn int_to_ip(fam: IpFam, v: u128) -> IpAddr {
    match fam {
        IpFam::V4 => IpAddr::V4(Ipv4Addr::from((v as u32).to_be_bytes())),
        IpFam::V6 => IpAddr::V6(Ipv6Addr::from(v.to_be_bytes())),
    }
}

/**
Numeric ordering of two addresses of the same family.

Returns `None` for a v4/v6 pair: addresses of different families are not
ordered relative to each other.
*/
pub fn cmp_versioned(a: IpAddr, b: IpAddr) -> Option<Ordering> {
    if IpFam::of(a) != IpFam::of(b) {
        return None;
    }
    Some(ip_to_int(a).cmp(&ip_to_int(b)))
}

/**
Address equality under a version-mismatch policy.

For a v4/v6 pair the answer is `ignore_version_mismatch` itself: `true`
means "no information, allow", `false` means "never matches".
*/
pub fn matches_versioned(a: IpAddr, b: IpAddr, ignore_version_mismatch: bool) -> bool {
    match cmp_versioned(a, b) {
        Some(ord) => ord == Ordering::Equal,
        None => ignore_version_mismatch,
    }
}

/// Render a collection as `[a,b,c]`.
pub fn render_list<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let parts: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(LIST_SEP))
}

/* -------------------------------------------------------------------------- */

/// Inclusive range of numeric addresses within one family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Range {
    pub fam: IpFam,
    pub beg: u128,
    /// inclusive
    pub end: u128,
}

impl Range {
    pub fn cmp_key(&self) -> (IpFam, u128, u128) {
        (self.fam, self.beg, self.end)
    }

    /// The length of the range. Cannot be an [usize] due to IPv6. Saturating.
    pub fn len(&self) -> u128 {
        let diff: u128 = self.end.saturating_sub(self.beg);
        if diff == u128::MAX {
            return u128::MAX;
        }
        diff.saturating_add(1)
    }

    pub fn to_ip_range(self) -> IpRange {
        IpRange {
            lower: int_to_ip(self.fam, self.beg),
            upper: int_to_ip(self.fam, self.end),
        }
    }
}

/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Cidr {
    /// network address, host bits may be set
    pub addr: IpAddr,
    /// **v4**: `0..=32`, **v6**: `0..=128`
    pub prefix: u8,
}

impl Cidr {
    /// Validating constructor.
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, AddressError> {
        IpNet::new(addr, prefix)
            .map(|_| Cidr { addr, prefix })
            .map_err(|_| AddressError::InvalidPrefix(format!("{addr}{SLASH}{prefix}")))
    }

    /// Convert a single IP (host) to an equivalent CIDR (/32 or /128).
    pub fn host(ip: IpAddr) -> Self {
        Cidr {
            addr: ip,
            prefix: IpFam::of(ip).bits(),
        }
    }

    pub fn fam(&self) -> IpFam {
        IpFam::of(self.addr)
    }

    /// Number of IP addresses contained by this [Cidr].
    /// Cannot be an [usize] due to IPv6. Saturating.
    pub fn len(&self) -> u128 {
        let bits: u8 = self.fam().bits();
        let host_bits: u8 = bits.saturating_sub(self.prefix);

        // 2^128 does not fit in u128
        if host_bits == IPV6_BITS {
            return u128::MAX;
        }

        1u128 << host_bits
    }

    /// Returns true if the CIDR represents a single host address.
    pub fn is_host(&self) -> bool {
        self.prefix == self.fam().bits()
    }

    /// Same block with host bits cleared.
    pub fn network(&self) -> Cidr {
        Cidr {
            addr: int_to_ip(self.fam(), cidr_to_range(*self).beg),
            prefix: self.prefix,
        }
    }

    /// The whole prefix block as an inclusive range.
    pub fn to_range(&self) -> IpRange {
        cidr_to_range(*self).to_ip_range()
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SLASH}{}", self.addr, self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = AddressError;

    /// Parses `ip/prefix`; a bare address becomes a host CIDR. Errors echo the whole input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: &str = s.trim();
        let invalid = || AddressError::InvalidPrefix(s.to_string());

        let Some((addr, prefix)) = s.split_once(SLASH) else {
            let addr: IpAddr = s.parse().map_err(|_| invalid())?;
            return Ok(Cidr::host(addr));
        };

        let addr: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.trim().parse().map_err(|_| invalid())?;

        Cidr::new(addr, prefix).map_err(|_| invalid())
    }
}

impl From<Cidr> for IpRange {
    fn from(c: Cidr) -> Self {
        c.to_range()
    }
}

/* -------------------------------------------------------------------------- */

/**
Closed range of IP addresses (both endpoints are included).

Endpoints are always the same family and always ordered: construction
from reversed endpoints swaps them.
*/
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpRange {
    lower: IpAddr,
    upper: IpAddr,
}

impl IpRange {
    /// Create a new [IpRange]. Fails on a v4/v6 pair, swaps reversed endpoints.
    pub fn new(lower: IpAddr, upper: IpAddr) -> Result<Self, AddressError> {
        match cmp_versioned(lower, upper) {
            None => Err(AddressError::VersionMismatch(lower, upper)),
            Some(Ordering::Greater) => Ok(Self {
                lower: upper,
                upper: lower,
            }),
            Some(_) => Ok(Self { lower, upper }),
        }
    }

    /// A range holding exactly one address.
    pub fn single(ip: IpAddr) -> Self {
        Self {
            lower: ip,
            upper: ip,
        }
    }

    pub fn lower(&self) -> IpAddr {
        self.lower
    }

    pub fn upper(&self) -> IpAddr {
        self.upper
    }

    pub fn fam(&self) -> IpFam {
        IpFam::of(self.lower)
    }

    pub fn is_single(&self) -> bool {
        self.lower == self.upper
    }

    /// Number of addresses in the range. Saturating for the full v6 space.
    pub fn len(&self) -> u128 {
        self.to_range().len()
    }

    /**
    Whether `ip` lies inside the range, endpoints included.

    An address of the other family answers `ignore_version_mismatch`.
    */
    pub fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        if IpFam::of(ip) != self.fam() {
            return ignore_version_mismatch;
        }
        let v: u128 = ip_to_int(ip);
        ip_to_int(self.lower) <= v && v <= ip_to_int(self.upper)
    }

    pub(crate) fn to_range(self) -> Range {
        Range {
            fam: self.fam(),
            beg: ip_to_int(self.lower),
            end: ip_to_int(self.upper),
        }
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            return write!(f, "{}", self.lower);
        }
        write!(f, "{}{RANGE_SEP}{}", self.lower, self.upper)
    }
}

impl FromStr for IpRange {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range(s)
    }
}

impl TryFrom<String> for IpRange {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_range(&s)
    }
}

impl From<IpRange> for String {
    fn from(r: IpRange) -> Self {
        r.to_string()
    }
}

/* -------------------------------------------------------------------------- */
