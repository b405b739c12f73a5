// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Fixed binary layout of a single [IpRange], big-endian, no padding:

```text
i32  byte_count   4 = IPv4, 16 = IPv6
i32  lower_len
[u8] lower bytes
i32  upper_len
[u8] upper bytes
```

A range array is the records back to back.
*/

use super::{
    structs::{IpFam, IpRange},
    AddressError, IPV4_BYTES, IPV6_BYTES,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const INT_LEN: usize = 4;

/// Size of the encoded record: 20 bytes for IPv4, 44 for IPv6.
pub fn encoded_len(range: &IpRange) -> usize {
    3 * INT_LEN + 2 * range.fam().byte_count()
}

/// Serialize one range.
pub fn encode(range: &IpRange) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(encoded_len(range));
    write_range(range, &mut out);
    out
}

/// Serialize ranges back to back.
pub fn encode_all(ranges: &[IpRange]) -> Vec<u8> {
    let total: usize = ranges.iter().map(encoded_len).sum();
    let mut out: Vec<u8> = Vec::with_capacity(total);
    for r in ranges {
        write_range(r, &mut out);
    }
    out
}

/// Deserialize exactly one range; leftover bytes are an error.
pub fn decode(data: &[u8]) -> Result<IpRange, AddressError> {
    let mut cur: &[u8] = data;
    let range: IpRange = read_range(&mut cur)?;
    if !cur.is_empty() {
        return Err(AddressError::TrailingBytes(cur.len()));
    }
    Ok(range)
}

/// Deserialize records until the input is exhausted.
pub fn decode_all(data: &[u8]) -> Result<Vec<IpRange>, AddressError> {
    let mut cur: &[u8] = data;
    let mut out: Vec<IpRange> = Vec::new();
    while !cur.is_empty() {
        out.push(read_range(&mut cur)?);
    }
    Ok(out)
}

/* ---------------------------------- */

fn write_range(range: &IpRange, out: &mut Vec<u8>) {
    out.extend_from_slice(&(range.fam().byte_count() as i32).to_be_bytes());
    for ip in [range.lower(), range.upper()] {
        let bytes: Vec<u8> = ip_bytes(ip);
        out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
        out.extend_from_slice(&bytes);
    }
}

fn ip_bytes(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(a) => a.octets().to_vec(),
        IpAddr::V6(a) => a.octets().to_vec(),
    }
}

fn read_range(cur: &mut &[u8]) -> Result<IpRange, AddressError> {
    let version: i32 = read_i32(cur)?;
    let fam: IpFam = match usize::try_from(version) {
        Ok(IPV4_BYTES) => IpFam::V4,
        Ok(IPV6_BYTES) => IpFam::V6,
        _ => return Err(AddressError::UnknownVersion(version)),
    };

    let lower: IpAddr = read_addr(cur, fam)?;
    let upper: IpAddr = read_addr(cur, fam)?;

    // span lower to upper in stored order; the constructor restores ordering
    IpRange::new(lower, upper)
}

fn read_addr(cur: &mut &[u8], fam: IpFam) -> Result<IpAddr, AddressError> {
    let len: i32 = read_i32(cur)?;
    let expected: usize = fam.byte_count();
    if usize::try_from(len) != Ok(expected) {
        return Err(AddressError::InvalidAddressLength { expected, got: len });
    }

    let bytes: &[u8] = take(cur, expected)?;
    Ok(match fam {
        IpFam::V4 => {
            let mut octets: [u8; IPV4_BYTES] = [0; IPV4_BYTES];
            octets.copy_from_slice(bytes);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        IpFam::V6 => {
            let mut octets: [u8; IPV6_BYTES] = [0; IPV6_BYTES];
            octets.copy_from_slice(bytes);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
    })
}

#[inline]
fn read_i32(cur: &mut &[u8]) -> Result<i32, AddressError> {
    let bytes: &[u8] = take(cur, INT_LEN)?;
    let mut buf: [u8; INT_LEN] = [0; INT_LEN];
    buf.copy_from_slice(bytes);
    Ok(i32::from_be_bytes(buf))
}

#[inline]
fn take<'a>(cur: &mut &'a [u8], n: usize) -> Result<&'a [u8], AddressError> {
    if cur.len() < n {
        return Err(AddressError::TruncatedInput {
            needed: n,
            available: cur.len(),
        });
    }
    let (head, tail) = cur.split_at(n);
    *cur = tail;
    Ok(head)
}

/* -------------------------------------------------------------------------- */
