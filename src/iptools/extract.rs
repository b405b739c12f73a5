// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    addresses::ParsedIp,
    matchers::IpRangeSet,
    strings::*,
    structs::{Cidr, IpRange},
};
use dashmap::DashMap;
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::net::IpAddr;
use tracing::{debug, trace};

/// Token count above which the scanner parses in parallel.
pub const PARALLEL_LIMIT: usize = 200;

lazy_static! {
    static ref RE_DASH: Regex = Regex::new(r"^([0-9A-Fa-f:.]+)[–-]([0-9A-Fa-f:.]+)$").unwrap();
    static ref RE_SLASH: Regex = Regex::new(r"^([0-9A-Fa-f:.]+)/([0-9A-Fa-f:.]+)$").unwrap();
    static ref RE_CIDR: Regex = Regex::new(r"^[0-9A-Fa-f:.]+/\d+$").unwrap();
    static ref RE_IP: Regex = Regex::new(r"^[0-9A-Fa-f:.]+$").unwrap();
}

/**
Loose parse result of free-form text: exact addresses and ranges kept
apart, in the order they were found. Never merged.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IpSetContents {
    pub addresses: Vec<IpAddr>,
    pub ranges: Vec<IpRange>,
}

impl IpSetContents {
    /**
    Exact membership in the address list, or containment in any range.
    The flag only applies to ranges; addresses never match across families.
    */
    pub fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        self.addresses.contains(&ip)
            || self
                .ranges
                .iter()
                .any(|r| r.contains(ip, ignore_version_mismatch))
    }

    pub fn contains_any_ip(&self, candidates: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        candidates.iter().any(|ip| self.addresses.contains(ip))
            || self.ranges.iter().any(|r| {
                candidates
                    .iter()
                    .any(|&ip| r.contains(ip, ignore_version_mismatch))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.ranges.is_empty()
    }

    /// Everything as one compiled set, addresses widened to single-address ranges.
    pub fn to_range_set(&self) -> IpRangeSet {
        self.addresses
            .iter()
            .map(|&ip| IpRange::single(ip))
            .chain(self.ranges.iter().copied())
            .collect()
    }

    fn push(&mut self, parsed: ParsedIp) {
        match parsed {
            ParsedIp::Address(ip) => self.addresses.push(ip),
            ParsedIp::Range(r) => self.ranges.push(r),
        }
    }
}

/* ---------------------------------- */

/// Both sides must be addresses of the same family.
fn parse_bounds(lower: &str, upper: &str) -> Option<IpRange> {
    let lower: IpAddr = lower.parse().ok()?;
    let upper: IpAddr = upper.parse().ok()?;
    IpRange::new(lower, upper).ok()
}

/// Prefix block of `ip/prefix`, host bits ignored.
fn parse_cidr_block(token: &str) -> Option<IpRange> {
    token.parse::<Cidr>().ok().map(|c| c.to_range())
}

/// Classify one trimmed, non-blank token. `None` drops it.
fn classify(token: &str) -> Option<ParsedIp> {
    if let Some(caps) = RE_DASH.captures(token) {
        return parse_bounds(&caps[1], &caps[2]).map(ParsedIp::Range);
    }
    if RE_CIDR.is_match(token) {
        return parse_cidr_block(token).map(ParsedIp::Range);
    }
    if let Some(caps) = RE_SLASH.captures(token) {
        return parse_bounds(&caps[1], &caps[2]).map(ParsedIp::Range);
    }
    if RE_IP.is_match(token) {
        return token.parse::<IpAddr>().ok().map(ParsedIp::Address);
    }
    None
}

/// Per-call memo of token results, keyed by the token slice.
type TokenMemo<'t> = DashMap<&'t str, Option<ParsedIp>>;

/**
Splits comma-delimited free text into addresses and ranges.

Unparseable tokens are dropped, never reported. Within one call, each
distinct token is classified once; the memo is dropped when the call
returns, so a long-lived scanner holds no per-token state.
*/
#[derive(Clone, Copy, Debug)]
pub struct TokenScanner {
    parallel_limit: usize,
}

impl Default for TokenScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenScanner {
    pub fn new() -> Self {
        Self::with_parallel_limit(PARALLEL_LIMIT)
    }

    pub fn with_parallel_limit(parallel_limit: usize) -> Self {
        Self { parallel_limit }
    }

    pub fn parallel_limit(&self) -> usize {
        self.parallel_limit
    }

    fn parse_token<'t>(memo: &TokenMemo<'t>, token: &'t str) -> Option<ParsedIp> {
        // the shard stays locked while classifying, so each token is computed once
        *memo.entry(token).or_insert_with(|| {
            let parsed: Option<ParsedIp> = classify(token);
            if parsed.is_none() {
                trace!(token, "dropped token");
            }
            parsed
        })
    }

    fn extract_with<'t>(&self, text: &'t str, memo: &TokenMemo<'t>) -> IpSetContents {
        let tokens: Vec<&'t str> = text
            .split(LIST_SEP)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let parsed: Vec<Option<ParsedIp>> = if tokens.len() > self.parallel_limit {
            debug!(tokens = tokens.len(), "scanning tokens in parallel");
            tokens
                .par_iter()
                .map(|&t| Self::parse_token(memo, t))
                .collect()
        } else {
            tokens
                .iter()
                .map(|&t| Self::parse_token(memo, t))
                .collect()
        };

        let mut out: IpSetContents = IpSetContents::default();
        parsed.into_iter().flatten().for_each(|p| out.push(p));
        out
    }

    pub fn extract(&self, text: &str) -> IpSetContents {
        self.extract_with(text, &TokenMemo::new())
    }
}

/// Scan with the default parallel limit.
pub fn extract_ip_set_contents(text: &str) -> IpSetContents {
    TokenScanner::new().extract(text)
}

/**
Which of `ips` fall inside the set described by `text`, with no version
mismatch tolerance.

`None` when nothing matches, the bare address when exactly one does, and a
JSON array of addresses in candidate order otherwise.
*/
pub fn get_matching_ips(text: &str, ips: &[IpAddr]) -> Option<String> {
    if text.trim().is_empty() || ips.is_empty() {
        return None;
    }
    let contents: IpSetContents = extract_ip_set_contents(text);
    if contents.is_empty() {
        return None;
    }

    let matching: Vec<String> = ips
        .iter()
        .filter(|&&ip| contents.contains(ip, false))
        .map(IpAddr::to_string)
        .collect();

    match matching.as_slice() {
        [] => None,
        [one] => Some(one.clone()),
        _ => serde_json::to_string(&matching).ok(),
    }
}

/* -------------------------------------------------------------------------- */
