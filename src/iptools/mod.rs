// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IP address, CIDR and range parsing, merging, and containment matching.

mod addresses;
mod bounded;
mod codec;
mod collapsing;
mod extract;
mod matchers;
mod strings;
mod structs;

use std::{error, fmt, net::IpAddr};
use strings::*;

pub use addresses::*;
pub use bounded::IpBoundedRange;
pub use codec::{decode, decode_all, encode, encode_all, encoded_len};
pub use collapsing::{collapse_ranges, merge_intervals, span_with_prefix_blocks, Intervals};
pub use extract::{extract_ip_set_contents, get_matching_ips, IpSetContents, TokenScanner, PARALLEL_LIMIT};
pub use matchers::*;
pub use structs::{cmp_versioned, int_to_ip, ip_to_int, matches_versioned, render_list, Cidr, IpFam, IpRange};

pub(crate) const IPV4_BITS: u8 = 32;
pub(crate) const IPV6_BITS: u8 = 128;
pub(crate) const IPV4_BYTES: usize = 4;
pub(crate) const IPV6_BYTES: usize = 16;

#[rustfmt::skip]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressError {
    /// blank input
    EmptyInput,
    /// no separator and not an address
    InvalidAddress(String),
    /// `ip/digits` that is not a valid CIDR
    InvalidPrefix(String),
    InvalidLowerBound(String),
    InvalidUpperBound(String),
    /// lower and upper are not the same IP family (v4 vs v6).
    VersionMismatch(IpAddr, IpAddr),
    /// nothing on one side of the separator
    MalformedRange(String),
    /// `sep` is set when one separator repeats, unset when two kinds are mixed
    MultipleSeparators { sep: Option<&'static str>, input: String },
    UnknownVersion(i32),
    TruncatedInput     { needed: usize, available: usize },
    InvalidAddressLength { expected: usize, got: i32 },
    TrailingBytes(usize),
    /// bounded range without either bound
    Unbounded,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::EmptyInput => {
                write!(f, "{ERR_EMPTY}")
            }
            AddressError::InvalidAddress(val) => {
                write!(f, "{ERR_MALFORMED_INPUT} '{val}'. {ERR_EXPECT_ANY}")
            }
            AddressError::InvalidPrefix(val) => {
                write!(f, "{ERR_MALFORMED_CIDR} '{val}'. {ERR_EXPECT_CIDR}")
            }
            AddressError::InvalidLowerBound(val) => {
                write!(f, "{ERR_LOWER} '{val}'.")
            }
            AddressError::InvalidUpperBound(val) => {
                write!(f, "{ERR_UPPER} '{val}'.")
            }
            AddressError::VersionMismatch(lower, upper) => {
                write!(f, "{ERR_MISMATCH}: '{lower}' vs '{upper}'.")
            }
            AddressError::MalformedRange(val) => {
                write!(f, "{ERR_MALFORMED} '{val}'. {ERR_EMPTY_SIDE}")
            }
            AddressError::MultipleSeparators { sep: Some(sep), input } => {
                write!(f, "{ERR_MULTIPLE} '{sep}' in '{input}'")
            }
            AddressError::MultipleSeparators { sep: None, input } => {
                write!(f, "{ERR_ONE_SEP}: '{input}'")
            }
            AddressError::UnknownVersion(ver) => {
                write!(f, "{ERR_UNKNOWN_VER}: {ver}")
            }
            AddressError::TruncatedInput { needed, available } => {
                write!(f, "{ERR_TRUNCATED}: need {needed} bytes, have {available}")
            }
            AddressError::InvalidAddressLength { expected, got } => {
                write!(f, "{ERR_ADDR_LEN}: expected {expected}, got {got}")
            }
            AddressError::TrailingBytes(n) => {
                write!(f, "{ERR_TRAILING}: {n}")
            }
            AddressError::Unbounded => {
                write!(f, "{ERR_UNBOUNDED}")
            }
        }
    }
}

impl error::Error for AddressError {}

/* -------------------------------------------------------------------------- */
