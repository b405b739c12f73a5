// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    structs::{int_to_ip, ip_to_int, IpFam, IpRange},
    AddressError,
};
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr};

/**
A range whose bounds may each be open (exclusive) or missing (unbounded).

At least one bound is required and both must be of the same family. The
default flavor is closed on both ends, which behaves exactly like [IpRange].
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBoundedRange")]
pub struct IpBoundedRange {
    lower: Option<IpAddr>,
    upper: Option<IpAddr>,
    lower_open: bool,
    upper_open: bool,
}

/// Unvalidated wire form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundedRange {
    #[serde(default)]
    lower: Option<IpAddr>,
    #[serde(default)]
    upper: Option<IpAddr>,
    #[serde(default)]
    lower_open: bool,
    #[serde(default)]
    upper_open: bool,
}

impl TryFrom<RawBoundedRange> for IpBoundedRange {
    type Error = AddressError;

    fn try_from(raw: RawBoundedRange) -> Result<Self, Self::Error> {
        IpBoundedRange::new(raw.lower, raw.upper, raw.lower_open, raw.upper_open)
    }
}

impl IpBoundedRange {
    pub fn new(
        lower: Option<IpAddr>,
        upper: Option<IpAddr>,
        lower_open: bool,
        upper_open: bool,
    ) -> Result<Self, AddressError> {
        match (lower, upper) {
            (None, None) => return Err(AddressError::Unbounded),
            (Some(l), Some(u)) if IpFam::of(l) != IpFam::of(u) => {
                return Err(AddressError::VersionMismatch(l, u));
            }
            _ => {}
        }
        Ok(Self {
            lower,
            upper,
            lower_open,
            upper_open,
        })
    }

    /// Both bounds present and inclusive.
    pub fn closed(lower: IpAddr, upper: IpAddr) -> Result<Self, AddressError> {
        Self::new(Some(lower), Some(upper), false, false)
    }

    pub fn lower(&self) -> Option<IpAddr> {
        self.lower
    }

    pub fn upper(&self) -> Option<IpAddr> {
        self.upper
    }

    pub fn is_lower_open(&self) -> bool {
        self.lower_open
    }

    pub fn is_upper_open(&self) -> bool {
        self.upper_open
    }

    pub fn fam(&self) -> IpFam {
        // new() guarantees at least one bound
        match (self.lower, self.upper) {
            (Some(ip), _) | (None, Some(ip)) => IpFam::of(ip),
            (None, None) => IpFam::V4,
        }
    }

    fn match_lower(&self, v: u128) -> bool {
        match self.lower.map(ip_to_int) {
            None => true,
            Some(l) if self.lower_open => v > l,
            Some(l) => v >= l,
        }
    }

    fn match_upper(&self, v: u128) -> bool {
        match self.upper.map(ip_to_int) {
            None => true,
            Some(u) if self.upper_open => v < u,
            Some(u) => v <= u,
        }
    }

    /**
    Whether `ip` satisfies both bounds.

    An address of the other family answers `ignore_version_mismatch`.
    */
    pub fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        if IpFam::of(ip) != self.fam() {
            return ignore_version_mismatch;
        }
        let v: u128 = ip_to_int(ip);
        self.match_lower(v) && self.match_upper(v)
    }

    pub fn contains_any_ip(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        ips.iter()
            .any(|&ip| self.contains(ip, ignore_version_mismatch))
    }

    /**
    The equivalent closed [IpRange], with missing bounds widened to the
    edges of the family. `None` when open bounds leave nothing inside,
    e.g. `(10.0.0.1, 10.0.0.2)`.
    */
    pub fn to_closed(&self) -> Option<IpRange> {
        let fam: IpFam = self.fam();
        let beg: u128 = match self.lower.map(ip_to_int) {
            None => 0,
            Some(l) if self.lower_open => l.checked_add(1)?,
            Some(l) => l,
        };
        let end: u128 = match self.upper.map(ip_to_int) {
            None => fam.max_value(),
            Some(u) if self.upper_open => u.checked_sub(1)?,
            Some(u) => u,
        };
        if beg > end {
            return None;
        }
        IpRange::new(int_to_ip(fam, beg), int_to_ip(fam, end)).ok()
    }
}

impl From<IpRange> for IpBoundedRange {
    fn from(r: IpRange) -> Self {
        Self {
            lower: Some(r.lower()),
            upper: Some(r.upper()),
            lower_open: false,
            upper_open: false,
        }
    }
}

impl fmt::Display for IpBoundedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open: char = if self.lower_open { '(' } else { '[' };
        let close: char = if self.upper_open { ')' } else { ']' };
        let lower: String = self.lower.map_or_else(|| "*".into(), |ip| ip.to_string());
        let upper: String = self.upper.map_or_else(|| "*".into(), |ip| ip.to_string());
        write!(f, "{open}{lower}, {upper}{close}")
    }
}

/* -------------------------------------------------------------------------- */
