// Copyright (c) 2025 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    strings::*,
    structs::{Cidr, IpRange},
    AddressError,
};
use std::{fmt, net::IpAddr};

/// Result of parsing one textual address or range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ParsedIp {
    Address(IpAddr),
    Range(IpRange),
}

impl ParsedIp {
    /// Widen to a range; a single address becomes a one-address range.
    pub fn to_range(self) -> IpRange {
        match self {
            ParsedIp::Address(ip) => IpRange::single(ip),
            ParsedIp::Range(r) => r,
        }
    }
}

impl fmt::Display for ParsedIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedIp::Address(ip) => write!(f, "{ip}"),
            ParsedIp::Range(r) => write!(f, "{r}"),
        }
    }
}

/* ---------------------------------- */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Separator {
    Arrow,
    Slash,
    Dash,
    EnDash,
}

impl Separator {
    fn token(&self) -> &'static str {
        match self {
            Separator::Arrow => ARROW,
            Separator::Slash => SLASH,
            Separator::Dash => DASH,
            Separator::EnDash => EN_DASH,
        }
    }
}

/// Separator kind and its byte offset in the input.
#[derive(Clone, Copy, Debug)]
struct SeparatorMatch {
    sep: Separator,
    pos: usize,
}

/**
Find the single separator in `value`.

`->` wins outright when present. Otherwise exactly one of `/`, `-`, `–`
may appear, and only once.
*/
fn detect_separator(value: &str) -> Result<Option<SeparatorMatch>, AddressError> {
    if let Some(pos) = value.find(ARROW) {
        ensure_single(value, Separator::Arrow, pos)?;
        return Ok(Some(SeparatorMatch {
            sep: Separator::Arrow,
            pos,
        }));
    }

    let mut found: Option<SeparatorMatch> = None;
    for sep in [Separator::Slash, Separator::Dash, Separator::EnDash] {
        if let Some(pos) = value.find(sep.token()) {
            if found.is_some() {
                return Err(AddressError::MultipleSeparators {
                    sep: None,
                    input: value.into(),
                });
            }
            ensure_single(value, sep, pos)?;
            found = Some(SeparatorMatch { sep, pos });
        }
    }
    Ok(found)
}

fn ensure_single(value: &str, sep: Separator, first: usize) -> Result<(), AddressError> {
    let rest: &str = &value[first + sep.token().len()..];
    if rest.contains(sep.token()) {
        return Err(AddressError::MultipleSeparators {
            sep: Some(sep.token()),
            input: value.into(),
        });
    }
    Ok(())
}

#[inline]
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/* ---------------------------------- */

/**
Parse an IP address, CIDR, or IP range from a string.

Supported formats:
- Single IP: `10.10.10.1`, `2001:db8::1`
- CIDR: `10.10.10.0/28` (host bits are ignored, `10.0.0.12/24` == `10.0.0.0/24`)
- Bounds: `10.0.0.1-10.0.0.9`, `10.0.0.1–10.0.0.9`, `10.0.0.1/10.0.0.9`, `10.0.0.1 -> 10.0.0.9`

Reversed bounds are normalized. Errors name the failing side and echo the
offending text.
*/
pub fn parse_ip_or_range(arg: impl AsRef<str>) -> Result<ParsedIp, AddressError> {
    let range: &str = arg.as_ref().trim();
    if range.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let Some(found) = detect_separator(range)? else {
        return range
            .parse::<IpAddr>()
            .map(ParsedIp::Address)
            .map_err(|_| AddressError::InvalidAddress(range.into()));
    };

    let left: &str = range[..found.pos].trim();
    let right: &str = range[found.pos + found.sep.token().len()..].trim();

    if left.is_empty() || right.is_empty() {
        return Err(AddressError::MalformedRange(range.into()));
    }

    // CIDR: ip/prefix
    if found.sep == Separator::Slash && is_digits(right) {
        let cidr: Cidr = range.parse()?;
        return Ok(ParsedIp::Range(cidr.to_range()));
    }

    let lower: IpAddr = left
        .parse()
        .map_err(|_| AddressError::InvalidLowerBound(left.into()))?;
    let upper: IpAddr = right
        .parse()
        .map_err(|_| AddressError::InvalidUpperBound(right.into()))?;

    Ok(ParsedIp::Range(IpRange::new(lower, upper)?))
}

/// Like [parse_ip_or_range], but a single address comes back as a one-address range.
pub fn parse_range(arg: impl AsRef<str>) -> Result<IpRange, AddressError> {
    parse_ip_or_range(arg).map(ParsedIp::to_range)
}

/// Parse every item as a range, failing on the first bad one.
pub fn parse_ip_list(items: &[impl AsRef<str>]) -> Result<Vec<IpRange>, AddressError> {
    items.iter().map(parse_range).collect()
}

/// Map strings to addresses, skipping anything that does not parse.
pub fn parse_addresses(items: &[impl AsRef<str>]) -> Vec<IpAddr> {
    items
        .iter()
        .filter_map(|s| s.as_ref().trim().parse::<IpAddr>().ok())
        .collect()
}

/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_1: &str = "192.168.1.1";
    const CIDR_1: &str = "10.0.0.12/24";
    const CIDR_2: &str = "10.0.0.0/24";
    const RANGE_DASH: &str = "10.0.0.1-10.0.0.5";
    const RANGE_EN_DASH: &str = "10.0.0.1–10.0.0.5";
    const RANGE_SLASH: &str = "10.0.0.1/10.0.0.5";
    const RANGE_ARROW: &str = "  10.0.0.1  ->  10.0.0.5  ";
    const RANGE_REV: &str = "10.0.0.5-10.0.0.1";
    const RANGE_V6: &str = "2001:db8::1 -> 2001:db8::ff";
    const MIXED: &str = "10.0.0.1 -> 2001:db8::1";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn range(a: &str, b: &str) -> IpRange {
        IpRange::new(ip(a), ip(b)).unwrap()
    }

    #[test]
    fn test_parse_single_ip() {
        assert_eq!(parse_ip_or_range(TEST_1), Ok(ParsedIp::Address(ip(TEST_1))));
        assert_eq!(parse_ip_or_range(" ::1 "), Ok(ParsedIp::Address(ip("::1"))));
    }

    #[test]
    fn test_parse_cidr_normalizes() {
        let a = parse_ip_or_range(CIDR_1).unwrap();
        let b = parse_ip_or_range(CIDR_2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, ParsedIp::Range(range("10.0.0.0", "10.0.0.255")));
    }

    #[test]
    fn test_parse_cidr_v6() {
        let r = parse_range("2001:db8::/126").unwrap();
        assert_eq!(r, range("2001:db8::", "2001:db8::3"));
        let host = parse_range("10.1.2.3/32").unwrap();
        assert!(host.is_single());
    }

    #[test]
    fn test_parse_bad_prefix() {
        assert_eq!(
            parse_ip_or_range("10.0.0.0/33"),
            Err(AddressError::InvalidPrefix("10.0.0.0/33".into()))
        );
        assert_eq!(
            parse_ip_or_range("10.0.0.x/24"),
            Err(AddressError::InvalidPrefix("10.0.0.x/24".into()))
        );
        assert!(parse_ip_or_range("::/129").is_err());
    }

    #[test]
    fn test_parse_all_separators() {
        let expected = ParsedIp::Range(range("10.0.0.1", "10.0.0.5"));
        for input in [RANGE_DASH, RANGE_EN_DASH, RANGE_SLASH, RANGE_ARROW, RANGE_REV] {
            assert_eq!(parse_ip_or_range(input), Ok(expected), "Failed: '{input}'");
        }
    }

    #[test]
    fn test_parse_v6_arrow() {
        let r = parse_range(RANGE_V6).unwrap();
        assert_eq!(r.lower().to_string(), "2001:db8::1");
        assert_eq!(r.upper().to_string(), "2001:db8::ff");
    }

    #[test]
    fn test_parse_same_ip_arrow() {
        let r = parse_range("192.168.1.5->192.168.1.5").unwrap();
        assert_eq!(r.lower(), r.upper());
        assert_eq!(r.to_string(), "192.168.1.5");
    }

    #[test]
    fn test_parse_invalid_sides() {
        assert_eq!(
            parse_ip_or_range("10.0.0.x->10.0.0.10"),
            Err(AddressError::InvalidLowerBound("10.0.0.x".into()))
        );
        assert_eq!(
            parse_ip_or_range("10.0.0.1->10.0.0.x"),
            Err(AddressError::InvalidUpperBound("10.0.0.x".into()))
        );
        let err = parse_ip_or_range("10.0.0.1/abc").unwrap_err();
        assert_eq!(err.to_string(), "Invalid upper IP 'abc'.");
    }

    #[test]
    fn test_parse_empty_side() {
        for input in ["->10.0.0.10", "10.0.0.1->", "-10.0.0.1", "10.0.0.1 /", " / "] {
            let err = parse_ip_or_range(input).unwrap_err();
            assert!(matches!(err, AddressError::MalformedRange(_)), "Failed: '{input}'");
            assert!(err.to_string().starts_with("Malformed"));
        }
    }

    #[test]
    fn test_parse_mismatch() {
        let err = parse_ip_or_range(MIXED).unwrap_err();
        assert_eq!(err, AddressError::VersionMismatch(ip("10.0.0.1"), ip("2001:db8::1")));
        assert!(err.to_string().contains("IPv4/IPv6 mismatch"));
    }

    #[test]
    fn test_parse_multiple_separators() {
        assert_eq!(
            parse_ip_or_range("10.0.0.1-10.0.0.2-10.0.0.3"),
            Err(AddressError::MultipleSeparators {
                sep: Some(DASH),
                input: "10.0.0.1-10.0.0.2-10.0.0.3".into()
            })
        );
        assert!(matches!(
            parse_ip_or_range("10.0.0.1->10.0.0.2->10.0.0.3"),
            Err(AddressError::MultipleSeparators { sep: Some(_), .. })
        ));
        assert!(matches!(
            parse_ip_or_range("10.0.0.1/24-10.0.0.3"),
            Err(AddressError::MultipleSeparators { sep: None, .. })
        ));
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(parse_ip_or_range(""), Err(AddressError::EmptyInput));
        assert_eq!(parse_ip_or_range("   \t"), Err(AddressError::EmptyInput));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(
            parse_ip_or_range("hello"),
            Err(AddressError::InvalidAddress("hello".into()))
        );
        assert_eq!(
            parse_ip_or_range("256.1.1.1").unwrap_err().to_string(),
            "Malformed input '256.1.1.1'. Expected IP, CIDR, or range."
        );
    }

    #[test]
    fn test_parse_lists() {
        let ranges = parse_ip_list(&["10.0.0.0/30", "10.0.0.9"]).unwrap();
        assert_eq!(ranges, vec![range("10.0.0.0", "10.0.0.3"), range("10.0.0.9", "10.0.0.9")]);
        assert!(parse_ip_list(&["10.0.0.0/30", "nope"]).is_err());

        let ips = parse_addresses(&["192.168.1.1", "bogus", "10.0.0.1"]);
        assert_eq!(ips, vec![ip("192.168.1.1"), ip("10.0.0.1")]);
    }
}
