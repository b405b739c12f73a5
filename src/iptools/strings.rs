// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

// separators, in detection order
pub(crate) static ARROW: &str = "->";
pub(crate) static SLASH: &str = "/";
pub(crate) static DASH: &str = "-";
pub(crate) static EN_DASH: &str = "–";

// rendering
pub(crate) static RANGE_SEP: &str = " -> ";
pub(crate) static LIST_SEP: &str = ",";

// addresses.rs
pub(crate) static ERR_EMPTY: &str = "Range cannot be null or empty";
pub(crate) static ERR_MALFORMED_INPUT: &str = "Malformed input";
pub(crate) static ERR_EXPECT_ANY: &str = "Expected IP, CIDR, or range.";
pub(crate) static ERR_MALFORMED_CIDR: &str = "Malformed CIDR";
pub(crate) static ERR_EXPECT_CIDR: &str = "Expected ip/prefix.";
pub(crate) static ERR_LOWER: &str = "Invalid lower IP";
pub(crate) static ERR_UPPER: &str = "Invalid upper IP";
pub(crate) static ERR_MISMATCH: &str = "IPv4/IPv6 mismatch";
pub(crate) static ERR_MALFORMED: &str = "Malformed";
pub(crate) static ERR_EMPTY_SIDE: &str = "Empty side around separator.";
pub(crate) static ERR_MULTIPLE: &str = "Multiple";
pub(crate) static ERR_ONE_SEP: &str = "Expected exactly one separator: '/', '-', '–', or '->'";

// codec.rs
pub(crate) static ERR_UNKNOWN_VER: &str = "Unknown IP version";
pub(crate) static ERR_TRUNCATED: &str = "truncated input";
pub(crate) static ERR_ADDR_LEN: &str = "invalid address length";
pub(crate) static ERR_TRAILING: &str = "trailing bytes after range";

// bounded.rs
pub(crate) static ERR_UNBOUNDED: &str = "At least one of the valid lower or upper bounds must be provided";
