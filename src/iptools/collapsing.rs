// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    structs::{int_to_ip, ip_to_int, Cidr, IpFam, IpRange, Range},
    IPV6_BITS,
};
use tracing::trace;

/**
Sorted, disjoint, non-adjacent inclusive intervals of one IP family,
kept as parallel arrays of numeric start and end values.

Built once by [merge_intervals]; there is no mutation API.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Intervals {
    fam: IpFam,
    starts: Vec<u128>,
    ends: Vec<u128>,
}

impl Intervals {
    fn new(fam: IpFam) -> Self {
        Self {
            fam,
            starts: Vec::new(),
            ends: Vec::new(),
        }
    }

    #[inline]
    fn push(&mut self, beg: u128, end: u128) {
        self.starts.push(beg);
        self.ends.push(end);
    }

    pub fn fam(&self) -> IpFam {
        self.fam
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// `(start, end)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u128, u128)> + '_ {
        self.starts.iter().copied().zip(self.ends.iter().copied())
    }

    /**
    Binary search: find the first interval starting above `v`, step back
    one and check that interval's end.
    */
    #[inline]
    pub fn contains_value(&self, v: u128) -> bool {
        let idx: usize = self.starts.partition_point(|&s| s <= v);
        idx > 0 && v <= self.ends[idx - 1]
    }

    pub fn to_ranges(&self) -> Vec<IpRange> {
        self.iter()
            .map(|(beg, end)| {
                Range {
                    fam: self.fam,
                    beg,
                    end,
                }
                .to_ip_range()
            })
            .collect()
    }
}

/* ---------------------------------- */

/**
Merge a collection of ranges into minimal disjoint intervals, one set per
IP family. Families never merge with each other.

Ranges merge when they overlap or are adjacent (`next.beg <= cur.end + 1`).
*/
pub fn merge_intervals(input: &[IpRange]) -> (Intervals, Intervals) {
    let mut ranges: Vec<Range> = input.iter().map(|r| r.to_range()).collect();

    // 1) Sort ranges, v4 before v6
    ranges.sort_unstable_by_key(|r| r.cmp_key());

    // 2) Merge overlaps/adjacent within each family
    let merged: Vec<Range> = merge_ranges(&ranges);

    // 3) Split by family
    let mut v4: Intervals = Intervals::new(IpFam::V4);
    let mut v6: Intervals = Intervals::new(IpFam::V6);
    for r in merged {
        match r.fam {
            IpFam::V4 => v4.push(r.beg, r.end),
            IpFam::V6 => v6.push(r.beg, r.end),
        }
    }

    trace!(
        input = input.len(),
        v4 = v4.len(),
        v6 = v6.len(),
        "merged ranges into intervals"
    );
    (v4, v6)
}

/**
Collapse a list of inclusive IP ranges into an equivalent, minimal set of CIDRs.

This does *not* enumerate IPs and hence scales to very large ranges.
*/
pub fn collapse_ranges(input: &[IpRange]) -> Vec<Cidr> {
    let (v4, v6) = merge_intervals(input);
    let mut out: Vec<Cidr> = Vec::with_capacity(v4.len() + v6.len());
    for ivals in [&v4, &v6] {
        for (beg, end) in ivals.iter() {
            out.extend(range_to_cidrs(Range {
                fam: ivals.fam,
                beg,
                end,
            }));
        }
    }
    out
}

/// The minimal set of prefix blocks exactly covering `range`, in ascending order.
pub fn span_with_prefix_blocks(range: &IpRange) -> Vec<Cidr> {
    range_to_cidrs(range.to_range())
}

/* ---------------------------------- */

/// Convert a CIDR to an inclusive range.
pub(crate) fn cidr_to_range(c: Cidr) -> Range {
    let fam: IpFam = c.fam();
    let bits: u8 = fam.bits();
    let pre: u8 = c.prefix.min(bits);
    let ip: u128 = ip_to_int(c.addr);
    let mask: u128 = mask_u128(bits, pre);
    let net: u128 = ip & mask;
    let end: u128 = net | (!mask & fam.max_value());
    Range { fam, beg: net, end }
}

/// Merge overlapping/adjacent ranges within each IP family. Input must be sorted.
#[inline]
fn merge_ranges(sorted: &[Range]) -> Vec<Range> {
    let mut out: Vec<Range> = Vec::with_capacity(sorted.len());
    for r in sorted.iter().copied() {
        if let Some(last) = out.last_mut() {
            if last.fam == r.fam {
                // overlap or adjacency?
                if r.beg <= last.end.saturating_add(1) {
                    if r.end > last.end {
                        last.end = r.end;
                    }
                    continue;
                }
            }
        }
        out.push(r);
    }
    out
}

/// Decompose an inclusive range into the minimal set of CIDRs.
fn range_to_cidrs(r: Range) -> Vec<Cidr> {
    let bits: u8 = r.fam.bits();

    // Full address space special-case, its length does not fit in u128 for v6
    if r.beg == 0 && r.end == r.fam.max_value() {
        #[rustfmt::skip]
        return vec![Cidr { addr: int_to_ip(r.fam, 0), prefix: 0 }];
    }

    let mut start: u128 = r.beg;
    let end: u128 = r.end;
    let mut out: Vec<Cidr> = Vec::new();

    loop {
        /*
        Largest block aligned at 'start' (power-of-two size).
        If start==0, trailing_zeros is 128; clamp alignment to bits.
        */
        let tz: u8 = start.trailing_zeros().min(bits as u32) as u8;
        let max_align_prefix: u8 = bits - tz;

        // largest block that fits in remaining range length
        let remaining: u128 = (end - start) + 1;
        let max_fit_prefix: u8 = bits - floor_log2_u128(remaining);

        let prefix: u8 = max_align_prefix.max(max_fit_prefix);

        out.push(Cidr {
            addr: int_to_ip(r.fam, start),
            prefix,
        });

        // prefix >= 1 for v6 here, so the shift stays below 128
        let block_size: u128 = 1u128 << (bits - prefix) as u32;
        match start.checked_add(block_size) {
            Some(next) if next <= end => start = next,
            _ => break,
        }
    }

    out
}

/* ---------------------------------- */

/**
Returns a u128 with prefix high bits set, remaining low bits zero.

bits: 32 or 128, prefix: `0..=bits`
*/
#[inline]
fn mask_u128(bits: u8, prefix: u8) -> u128 {
    if prefix == 0 {
        return 0;
    }
    if prefix >= bits {
        return !0u128;
    }
    /*
    Example (bits=32,prefix=24): top 24 bits 1, low 8 bits 0.
    Create full-ones in 'bits' width, then clear low (bits-prefix) bits.
    */
    let all: u128 = if bits == IPV6_BITS {
        !0u128
    } else {
        (1u128 << bits) - 1
    };
    let low: u8 = bits - prefix;
    all & (!((1u128 << low) - 1))
}

/// floor(log2(x)) for x>=1, returns in [0..127]
#[inline]
fn floor_log2_u128(x: u128) -> u8 {
    debug_assert!(x >= 1);
    127u8.saturating_sub(x.leading_zeros() as u8)
}

/* -------------------------------------------------------------------------- */
