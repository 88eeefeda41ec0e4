// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod backup;
pub mod categories;
pub mod ledgers;
pub mod stats;
pub mod stocks;
pub mod transactions;
pub mod transfers;

use anyhow::{Result, anyhow};
use clap::ArgMatches;
use rust_decimal::Decimal;

use crate::utils::parse_decimal;

/// A string argument clap has already enforced as present.
pub(crate) fn req<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.trim())
        .ok_or_else(|| anyhow!("missing --{}", id))
}

pub(crate) fn req_decimal(m: &ArgMatches, id: &str) -> Result<Decimal> {
    parse_decimal(req(m, id)?)
}

pub(crate) fn opt_decimal(m: &ArgMatches, id: &str) -> Result<Option<Decimal>> {
    m.get_one::<String>(id)
        .map(|s| parse_decimal(s))
        .transpose()
}
