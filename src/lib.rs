// Copyright (c) 2024-2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod iptools;

pub use iptools::{
    compile, contains, contains_any, decode, encode, extract_ip_set_contents, parse_ip_or_range,
    parse_range, AddressError, CompileOptions, CompiledMatcher, IpMatcher, IpRange, IpRangeSet,
    IpSetContents, IpValue, Strategy, TokenScanner,
};

/* ######################################################################### */
