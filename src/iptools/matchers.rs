// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    addresses::{parse_range, ParsedIp},
    collapsing::{collapse_ranges, merge_intervals, Intervals},
    strings::*,
    structs::{ip_to_int, matches_versioned, render_list, Cidr, IpFam, IpRange},
    AddressError,
};
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr, str::FromStr};
use tracing::debug;

/// Merged interval count above which [Strategy::Auto] builds a prefix trie.
pub const DEFAULT_TRIE_THRESHOLD: usize = 1024;

/**
Containment queries over a compiled set of ranges.

When the set holds no ranges at all of the queried address' family, the
answer is `ignore_version_mismatch`.
*/
pub trait IpMatcher {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool;

    /// Whether any of `ips` is contained.
    fn contains_any(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        ips.iter()
            .any(|&ip| self.contains(ip, ignore_version_mismatch))
    }
}

/**
Two-pointer co-scan: is any of `addrs` inside any of `ranges`?

Both inputs must be sorted ascending (`ranges` by start). Ranges may
overlap. Runs in O(n + m).
*/
pub fn any_in_sorted<I>(addrs: &[u128], ranges: I) -> bool
where I: IntoIterator<Item = (u128, u128)>,
{
    let mut addrs = addrs.iter().copied().peekable();
    let mut ranges = ranges.into_iter().peekable();

    while let (Some(&a), Some(&(beg, end))) = (addrs.peek(), ranges.peek()) {
        if a < beg {
            addrs.next();
        } else if a > end {
            ranges.next();
        } else {
            return true;
        }
    }
    false
}

/// Split query addresses by family into sorted numeric values.
fn sorted_by_family(ips: &[IpAddr]) -> (Vec<u128>, Vec<u128>) {
    let mut v4: Vec<u128> = Vec::new();
    let mut v6: Vec<u128> = Vec::new();
    for &ip in ips {
        match IpFam::of(ip) {
            IpFam::V4 => v4.push(ip_to_int(ip)),
            IpFam::V6 => v6.push(ip_to_int(ip)),
        }
    }
    v4.sort_unstable();
    v6.sort_unstable();
    (v4, v6)
}

/* -------------------------------------------------------------------------- */

/// Binary search over merged, sorted interval bounds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortedIntervals {
    v4: Intervals,
    v6: Intervals,
}

impl SortedIntervals {
    pub fn new(ranges: &[IpRange]) -> Self {
        let (v4, v6) = merge_intervals(ranges);
        Self { v4, v6 }
    }

    pub fn family(&self, fam: IpFam) -> &Intervals {
        match fam {
            IpFam::V4 => &self.v4,
            IpFam::V6 => &self.v6,
        }
    }

    /// Total number of disjoint intervals over both families.
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The merged intervals as ranges, v4 first.
    pub fn to_range_list(&self) -> Vec<IpRange> {
        let mut out: Vec<IpRange> = self.v4.to_ranges();
        out.extend(self.v6.to_ranges());
        out
    }

    /// Batch query with one sorted co-scan per family.
    pub fn contains_any_sorted(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        let (q4, q6) = sorted_by_family(ips);
        for (addrs, ivals) in [(&q4, &self.v4), (&q6, &self.v6)] {
            if addrs.is_empty() {
                continue;
            }
            if ivals.is_empty() {
                if ignore_version_mismatch {
                    return true;
                }
                continue;
            }
            if any_in_sorted(addrs, ivals.iter()) {
                return true;
            }
        }
        false
    }
}

impl IpMatcher for SortedIntervals {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        let ivals: &Intervals = self.family(IpFam::of(ip));
        if ivals.is_empty() {
            return ignore_version_mismatch;
        }
        ivals.contains_value(ip_to_int(ip))
    }
}

/* ---------------------------------- */

/**
Linear scan over ranges sorted by start, without merging.

Single lookups stop at the first range starting past the address; batches
use [any_in_sorted].
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortedScan {
    v4: Vec<(u128, u128)>,
    v6: Vec<(u128, u128)>,
}

impl SortedScan {
    pub fn new(ranges: &[IpRange]) -> Self {
        let mut v4: Vec<(u128, u128)> = Vec::new();
        let mut v6: Vec<(u128, u128)> = Vec::new();
        for r in ranges {
            let pair: (u128, u128) = (ip_to_int(r.lower()), ip_to_int(r.upper()));
            match r.fam() {
                IpFam::V4 => v4.push(pair),
                IpFam::V6 => v6.push(pair),
            }
        }
        for list in [&mut v4, &mut v6] {
            list.sort_unstable();
            list.dedup();
        }
        Self { v4, v6 }
    }

    fn family(&self, fam: IpFam) -> &[(u128, u128)] {
        match fam {
            IpFam::V4 => &self.v4,
            IpFam::V6 => &self.v6,
        }
    }
}

impl IpMatcher for SortedScan {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        let list: &[(u128, u128)] = self.family(IpFam::of(ip));
        if list.is_empty() {
            return ignore_version_mismatch;
        }
        let v: u128 = ip_to_int(ip);
        for &(beg, end) in list {
            if beg > v {
                return false;
            }
            if v <= end {
                return true;
            }
        }
        false
    }

    fn contains_any(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        let (q4, q6) = sorted_by_family(ips);
        for (addrs, list) in [(&q4, &self.v4), (&q6, &self.v6)] {
            if addrs.is_empty() {
                continue;
            }
            if list.is_empty() {
                if ignore_version_mismatch {
                    return true;
                }
                continue;
            }
            if any_in_sorted(addrs, list.iter().copied()) {
                return true;
            }
        }
        false
    }
}

/* ---------------------------------- */

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Node {
    /// child index per bit, 0 = none (the root is never a child)
    children: [u32; 2],
    /// a whole prefix block ends here
    terminal: bool,
}

/// Binary trie over the address bits of one family, MSB first.
#[derive(Clone, Debug, Eq, PartialEq)]
struct BitTrie {
    bits: u8,
    nodes: Vec<Node>,
    blocks: usize,
}

impl BitTrie {
    fn new(bits: u8) -> Self {
        Self {
            bits,
            nodes: vec![Node::default()],
            blocks: 0,
        }
    }

    #[inline]
    fn bit_at(&self, key: u128, depth: u8) -> usize {
        ((key >> (self.bits - 1 - depth) as u32) & 1) as usize
    }

    fn insert(&mut self, key: u128, prefix: u8) {
        let mut idx: usize = 0;
        for depth in 0..prefix {
            if self.nodes[idx].terminal {
                // already covered by a shorter block
                return;
            }
            let bit: usize = self.bit_at(key, depth);
            let child: u32 = self.nodes[idx].children[bit];
            idx = if child == 0 {
                self.nodes.push(Node::default());
                let new: usize = self.nodes.len() - 1;
                self.nodes[idx].children[bit] = new as u32;
                new
            } else {
                child as usize
            };
        }
        self.nodes[idx].terminal = true;
        self.blocks += 1;
    }

    fn contains(&self, key: u128) -> bool {
        let mut idx: usize = 0;
        for depth in 0..self.bits {
            let node: &Node = &self.nodes[idx];
            if node.terminal {
                return true;
            }
            match node.children[self.bit_at(key, depth)] {
                0 => return false,
                child => idx = child as usize,
            }
        }
        self.nodes[idx].terminal
    }
}

/**
Prefix trie membership: every range is decomposed into prefix blocks and
inserted into a per-family binary trie; an address is contained when its
descent passes through a terminal node.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefixTrie {
    v4: BitTrie,
    v6: BitTrie,
}

impl PrefixTrie {
    pub fn new(ranges: &[IpRange]) -> Self {
        let mut trie: PrefixTrie = Self {
            v4: BitTrie::new(IpFam::V4.bits()),
            v6: BitTrie::new(IpFam::V6.bits()),
        };
        for cidr in collapse_ranges(ranges) {
            trie.insert(cidr);
        }
        trie
    }

    fn insert(&mut self, cidr: Cidr) {
        let key: u128 = ip_to_int(cidr.addr);
        match cidr.fam() {
            IpFam::V4 => self.v4.insert(key, cidr.prefix),
            IpFam::V6 => self.v6.insert(key, cidr.prefix),
        }
    }

    /// Number of prefix blocks stored.
    pub fn blocks(&self) -> usize {
        self.v4.blocks + self.v6.blocks
    }
}

impl IpMatcher for PrefixTrie {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        let trie: &BitTrie = match IpFam::of(ip) {
            IpFam::V4 => &self.v4,
            IpFam::V6 => &self.v6,
        };
        if trie.blocks == 0 {
            return ignore_version_mismatch;
        }
        trie.contains(ip_to_int(ip))
    }
}

/* -------------------------------------------------------------------------- */

/// Single-address lookup structure of a [CompiledMatcher].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// prefix trie above the threshold, binary search otherwise
    #[default]
    Auto,
    SortedIntervals,
    PrefixTrie,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub strategy: Strategy,
    pub trie_threshold: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            trie_threshold: DEFAULT_TRIE_THRESHOLD,
        }
    }
}

/**
Query-ready form of a range collection.

Holds the merged intervals, plus a prefix trie when the strategy calls for
one. Batches of more than one address always go through the sorted
co-scan. Immutable once built.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompiledMatcher {
    intervals: SortedIntervals,
    trie: Option<PrefixTrie>,
}

impl CompiledMatcher {
    pub fn new(ranges: &[IpRange]) -> Self {
        Self::with_options(ranges, CompileOptions::default())
    }

    pub fn with_options(ranges: &[IpRange], opts: CompileOptions) -> Self {
        let intervals: SortedIntervals = SortedIntervals::new(ranges);
        let use_trie: bool = match opts.strategy {
            Strategy::Auto => intervals.len() > opts.trie_threshold,
            Strategy::SortedIntervals => false,
            Strategy::PrefixTrie => true,
        };
        let trie: Option<PrefixTrie> = use_trie.then(|| PrefixTrie::new(&intervals.to_range_list()));

        debug!(
            ranges = ranges.len(),
            v4 = intervals.family(IpFam::V4).len(),
            v6 = intervals.family(IpFam::V6).len(),
            trie_blocks = trie.as_ref().map_or(0, |t| t.blocks()),
            "compiled range matcher"
        );
        Self { intervals, trie }
    }

    /// Lookup structure in use for single addresses.
    pub fn strategy(&self) -> Strategy {
        match self.trie {
            Some(_) => Strategy::PrefixTrie,
            None => Strategy::SortedIntervals,
        }
    }

    pub fn intervals(&self) -> &SortedIntervals {
        &self.intervals
    }

    /// Merged, disjoint ranges, v4 first. Compiling these again yields the same matcher data.
    pub fn to_range_list(&self) -> Vec<IpRange> {
        self.intervals.to_range_list()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl IpMatcher for CompiledMatcher {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        match &self.trie {
            Some(trie) => trie.contains(ip, ignore_version_mismatch),
            None => self.intervals.contains(ip, ignore_version_mismatch),
        }
    }

    fn contains_any(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        match ips {
            [] => false,
            [ip] => self.contains(*ip, ignore_version_mismatch),
            _ => self
                .intervals
                .contains_any_sorted(ips, ignore_version_mismatch),
        }
    }
}

/// Build a [CompiledMatcher] with default options.
pub fn compile(ranges: &[IpRange]) -> CompiledMatcher {
    CompiledMatcher::new(ranges)
}

pub fn contains(matcher: &CompiledMatcher, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
    matcher.contains(ip, ignore_version_mismatch)
}

pub fn contains_any(matcher: &CompiledMatcher, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
    matcher.contains_any(ips, ignore_version_mismatch)
}

/* -------------------------------------------------------------------------- */

/**
Ordered, deduplicated ranges of either family together with the matcher
compiled from them. Never mutated: build a new set to change it.
*/
#[derive(Clone, Debug)]
pub struct IpRangeSet {
    ranges: Vec<IpRange>,
    matcher: CompiledMatcher,
}

impl IpRangeSet {
    pub fn new(ranges: impl IntoIterator<Item = IpRange>) -> Self {
        Self::with_options(ranges, CompileOptions::default())
    }

    pub fn with_options(ranges: impl IntoIterator<Item = IpRange>, opts: CompileOptions) -> Self {
        let mut ranges: Vec<IpRange> = ranges.into_iter().collect();
        ranges.sort_unstable();
        ranges.dedup();
        let matcher: CompiledMatcher = CompiledMatcher::with_options(&ranges, opts);
        Self { ranges, matcher }
    }

    /// Input ranges, sorted and deduplicated but not merged.
    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }

    /// Merged, disjoint ranges.
    pub fn to_range_list(&self) -> Vec<IpRange> {
        self.matcher.to_range_list()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl IpMatcher for IpRangeSet {
    fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        self.matcher.contains(ip, ignore_version_mismatch)
    }

    fn contains_any(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        self.matcher.contains_any(ips, ignore_version_mismatch)
    }
}

impl PartialEq for IpRangeSet {
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
    }
}

impl Eq for IpRangeSet {}

impl fmt::Display for IpRangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_list(&self.ranges))
    }
}

impl FromStr for IpRangeSet {
    type Err = AddressError;

    /// Comma-delimited ranges; every item must parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ranges: Vec<IpRange> = s
            .split(LIST_SEP)
            .filter(|item| !item.trim().is_empty())
            .map(parse_range)
            .collect::<Result<Vec<IpRange>, AddressError>>()?;
        Ok(Self::new(ranges))
    }
}

impl FromIterator<IpRange> for IpRangeSet {
    fn from_iter<T: IntoIterator<Item = IpRange>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/* ---------------------------------- */

/// Anything a containment query can be asked against.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IpValue {
    Address(IpAddr),
    Range(IpRange),
    RangeSet(IpRangeSet),
}

impl IpValue {
    pub fn contains(&self, ip: IpAddr, ignore_version_mismatch: bool) -> bool {
        match self {
            IpValue::Address(addr) => matches_versioned(*addr, ip, ignore_version_mismatch),
            IpValue::Range(r) => r.contains(ip, ignore_version_mismatch),
            IpValue::RangeSet(set) => set.contains(ip, ignore_version_mismatch),
        }
    }

    pub fn contains_any(&self, ips: &[IpAddr], ignore_version_mismatch: bool) -> bool {
        match self {
            IpValue::RangeSet(set) => set.contains_any(ips, ignore_version_mismatch),
            _ => ips
                .iter()
                .any(|&ip| self.contains(ip, ignore_version_mismatch)),
        }
    }
}

impl From<ParsedIp> for IpValue {
    fn from(p: ParsedIp) -> Self {
        match p {
            ParsedIp::Address(ip) => IpValue::Address(ip),
            ParsedIp::Range(r) => IpValue::Range(r),
        }
    }
}

impl From<IpRangeSet> for IpValue {
    fn from(set: IpRangeSet) -> Self {
        IpValue::RangeSet(set)
    }
}

impl fmt::Display for IpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpValue::Address(ip) => write!(f, "{ip}"),
            IpValue::Range(r) => write!(f, "{r}"),
            IpValue::RangeSet(set) => write!(f, "{set}"),
        }
    }
}

/* -------------------------------------------------------------------------- */
