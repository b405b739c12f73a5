// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use ipmatch::iptools::{
    any_in_sorted, compile, contains, contains_any, decode, decode_all, encode, encode_all,
    extract_ip_set_contents, int_to_ip, ip_to_int, parse_ip_or_range, parse_range, CompileOptions,
    CompiledMatcher, IpMatcher, IpRange, IpRangeSet, PrefixTrie, SortedIntervals, SortedScan,
    IpFam, Strategy,
};
use std::net::{IpAddr, Ipv6Addr};

const RANGES: [&str; 8] = [
    "10.0.0.0/25",
    "10.0.0.128/25",
    "10.0.3.7 -> 10.0.3.9",
    "10.0.2.250-10.0.3.8",
    "192.168.1.1",
    "2001:db8::/120",
    "2001:db8::1:0 – 2001:db8::1:ff",
    "fe80::1/fe80::10",
];

/// Deterministic xorshift so failures reproduce.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u32) -> u32 {
        (self.next() % n as u64) as u32
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn fixture() -> Vec<IpRange> {
    RANGES.iter().map(|s| parse_range(s).unwrap()).collect()
}

/// Address windows the random cases draw from: (family, base). Each window
/// is 4096 addresses wide; two of them end at the top of their family.
const WINDOWS: [(IpFam, u128); 4] = [
    (IpFam::V4, 0x0a00_0000),
    (IpFam::V4, u32::MAX as u128 - 4095),
    (IpFam::V6, 0x2001_0db8 << 96),
    (IpFam::V6, u128::MAX - 4095),
];

fn window_addr(rng: &mut Rng, w: usize, spread: u32) -> u128 {
    let (fam, base) = WINDOWS[w];
    base.saturating_add(rng.below(spread) as u128).min(fam.max_value())
}

/// Random ranges over a random subset of windows, probes over all of them,
/// so some probes always hit a family the set does not hold.
fn random_case(rng: &mut Rng) -> (Vec<IpRange>, Vec<IpAddr>) {
    let mask: u32 = rng.below(15) + 1;
    let used: Vec<usize> = (0..WINDOWS.len()).filter(|&w| mask & (1 << w) != 0).collect();

    let ranges: Vec<IpRange> = (0..rng.below(40) + 1)
        .map(|_| {
            let w: usize = used[rng.below(used.len() as u32) as usize];
            let fam: IpFam = WINDOWS[w].0;
            let a: u128 = window_addr(rng, w, 4096);
            let b: u128 = a.saturating_add(rng.below(64) as u128).min(fam.max_value());
            IpRange::new(int_to_ip(fam, b), int_to_ip(fam, a)).unwrap()
        })
        .collect();
    let probes: Vec<IpAddr> = (0..60)
        .map(|_| {
            let w: usize = rng.below(WINDOWS.len() as u32) as usize;
            int_to_ip(WINDOWS[w].0, window_addr(rng, w, 4200))
        })
        .collect();
    (ranges, probes)
}

/// Reference answer: linear scan, with the family policy of compiled sets.
fn brute_force(ranges: &[IpRange], ip: IpAddr, ignore: bool) -> bool {
    if !ranges.iter().any(|r| r.fam() == IpFam::of(ip)) {
        return ignore;
    }
    ranges.iter().any(|r| r.contains(ip, false))
}

fn forced(ranges: &[IpRange], strategy: Strategy) -> CompiledMatcher {
    let opts = CompileOptions {
        strategy,
        ..Default::default()
    };
    CompiledMatcher::with_options(ranges, opts)
}

#[test]
fn test_matchers_agree_random() {
    let mut rng = Rng(0x5eed_1234_abcd_0001);
    for round in 0..200 {
        let (ranges, probes) = random_case(&mut rng);
        let matchers: Vec<(&str, Box<dyn IpMatcher>)> = vec![
            ("binary", Box::new(SortedIntervals::new(&ranges))),
            ("scan", Box::new(SortedScan::new(&ranges))),
            ("trie", Box::new(PrefixTrie::new(&ranges))),
            ("compiled-binary", Box::new(forced(&ranges, Strategy::SortedIntervals))),
            ("compiled-trie", Box::new(forced(&ranges, Strategy::PrefixTrie))),
        ];

        for ignore in [false, true] {
            for &p in &probes {
                let expected: bool = brute_force(&ranges, p, ignore);
                for (name, m) in &matchers {
                    assert_eq!(m.contains(p, ignore), expected, "round {round}, {name}, {ignore}: {p}");
                }
            }
            for chunk in probes.chunks(7) {
                let expected: bool = chunk.iter().any(|&p| brute_force(&ranges, p, ignore));
                for (name, m) in &matchers {
                    assert_eq!(
                        m.contains_any(chunk, ignore),
                        expected,
                        "round {round}, {name}, {ignore}: {chunk:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_matchers_agree_wide_ranges() {
    let ranges: Vec<IpRange> = ["::1-ffff:ffff:ffff:ffff:ffff:ffff:ffff:fffe", "255.255.255.254/31"]
        .iter()
        .map(|s| parse_range(s).unwrap())
        .collect();
    let probes: [(&str, bool); 7] = [
        ("::", false),
        ("::1", true),
        ("8000::", true),
        ("ffff:ffff:ffff:ffff:ffff:ffff:ffff:fffe", true),
        ("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff", false),
        ("255.255.255.255", true),
        ("255.255.255.253", false),
    ];
    let matchers: Vec<Box<dyn IpMatcher>> = vec![
        Box::new(SortedIntervals::new(&ranges)),
        Box::new(SortedScan::new(&ranges)),
        Box::new(PrefixTrie::new(&ranges)),
        Box::new(forced(&ranges, Strategy::PrefixTrie)),
    ];
    for m in &matchers {
        for (addr, expected) in probes {
            assert_eq!(m.contains(ip(addr), false), expected, "Failed: {addr}");
        }
        assert!(!m.contains_any(&[ip("::"), ip("255.255.255.253")], true));
    }
}

#[test]
fn test_co_scan_unmerged() {
    let ranges: Vec<IpRange> = fixture();
    let mut pairs: Vec<(u128, u128)> = ranges
        .iter()
        .filter(|r| r.lower().is_ipv4())
        .map(|r| (ip_to_int(r.lower()), ip_to_int(r.upper())))
        .collect();
    pairs.sort_unstable();

    let mut addrs: Vec<u128> = ["10.0.1.0", "10.0.3.8", "11.0.0.0"]
        .iter()
        .map(|s| ip_to_int(ip(s)))
        .collect();
    addrs.sort_unstable();
    assert!(any_in_sorted(&addrs, pairs.iter().copied()));

    let misses: Vec<u128> = vec![ip_to_int(ip("10.0.1.0")), ip_to_int(ip("10.0.3.10"))];
    assert!(!any_in_sorted(&misses, pairs.iter().copied()));
}

#[test]
fn test_compile_idempotent() {
    let first: CompiledMatcher = compile(&fixture());
    let merged: Vec<IpRange> = first.to_range_list();
    let second: CompiledMatcher = compile(&merged);
    assert_eq!(second.to_range_list(), merged);
    assert_eq!(first, second);

    let texts: Vec<String> = merged.iter().map(IpRange::to_string).collect();
    assert_eq!(
        texts,
        vec![
            "10.0.0.0 -> 10.0.0.255",
            "10.0.2.250 -> 10.0.3.9",
            "192.168.1.1",
            "2001:db8:: -> 2001:db8::ff",
            "2001:db8::1:0 -> 2001:db8::1:ff",
            "fe80::1 -> fe80::10",
        ]
    );
}

#[test]
fn test_codec_roundtrip_parsed() {
    let ranges: Vec<IpRange> = fixture();
    for r in &ranges {
        let bytes: Vec<u8> = encode(r);
        assert_eq!(decode(&bytes), Ok(*r), "Failed: {r}");
    }
    assert_eq!(decode_all(&encode_all(&ranges)), Ok(ranges));
}

#[test]
fn test_version_mismatch_v4_only() {
    let m: CompiledMatcher = compile(&[parse_range("10.0.0.0/8").unwrap()]);
    let v6: IpAddr = IpAddr::V6(Ipv6Addr::LOCALHOST);
    assert!(contains(&m, v6, true));
    assert!(!contains(&m, v6, false));
    assert!(contains_any(&m, &[v6, ip("11.0.0.1")], true));
    assert!(!contains_any(&m, &[v6, ip("11.0.0.1")], false));
}

#[test]
fn test_boundaries_inclusive() {
    let m: CompiledMatcher = compile(&[parse_range("10.0.0.5-10.0.0.10").unwrap()]);
    let cases: [(&str, bool); 4] = [
        ("10.0.0.4", false),
        ("10.0.0.5", true),
        ("10.0.0.10", true),
        ("10.0.0.11", false),
    ];
    for (addr, expected) in cases {
        assert_eq!(contains(&m, ip(addr), false), expected, "Failed: {addr}");
    }
}

#[test]
fn test_cidr_host_bits() {
    assert_eq!(parse_ip_or_range("10.0.0.12/24"), parse_ip_or_range("10.0.0.0/24"));
}

#[test]
fn test_end_to_end() {
    let contents = extract_ip_set_contents("192.168.1.1-192.168.1.100,10.0.0.0/24");
    assert_eq!(contents.addresses.len(), 0);
    assert_eq!(contents.ranges.len(), 2);
    assert!(contents.contains_any_ip(&[ip("192.168.1.50")], false));
    assert!(!contents.contains_any_ip(&[ip("172.16.0.1")], false));

    let set: IpRangeSet = contents.to_range_set();
    assert!(set.contains_any(&[ip("172.16.0.1"), ip("10.0.0.99")], false));
    assert_eq!(set.to_string(), "[10.0.0.0 -> 10.0.0.255,192.168.1.1 -> 192.168.1.100]");
}
