// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use ipmatch::{IpMatcher, IpRangeSet};
use std::{env, net::IpAddr, process::ExitCode};

const USAGE: &str = "usage: iprange-check <range[,range...]> <ip> [ip...]";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((ranges, queries)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let set: IpRangeSet = match ranges.parse() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Ranges: {set}");
    eprintln!("Merged: {}", set.to_range_list().len());

    for q in queries {
        let ip: IpAddr = match q.trim().parse() {
            Ok(ip) => ip,
            Err(_) => {
                eprintln!("Not an IP address: '{q}'");
                println!("{q}\tinvalid");
                continue;
            }
        };
        let verdict: &str = if set.contains(ip, false) { "in" } else { "out" };
        println!("{ip}\t{verdict}");
    }
    ExitCode::SUCCESS
}
