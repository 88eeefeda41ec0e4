// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

use crate::commands::req;
use crate::db::currency_for_ledger;
use crate::ledger::stats::{StatsTarget, period_series};
use crate::models::Period;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};

pub fn handle(conn: &Connection, ledger: &str, m: &clap::ArgMatches) -> Result<()> {
    let target = match m.get_one::<String>("category") {
        Some(category) => StatsTarget::Category(category.trim().to_string()),
        None => StatsTarget::Kind(req(m, "kind")?.parse()?),
    };
    let period: Period = req(m, "period")?.parse()?;
    let count = *m.get_one::<usize>("count").unwrap_or(&6);
    let as_of = match m.get_one::<String>("as-of") {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };

    let series = period_series(conn, ledger, &target, period, count, as_of)?;
    if maybe_print_json(m.get_flag("json"), &series)? {
        return Ok(());
    }
    let symbol = currency_for_ledger(conn, ledger)?.symbol();
    let data = series
        .iter()
        .map(|p| vec![p.period.clone(), fmt_money(&p.amount, symbol)])
        .collect();
    println!("{}", pretty_table(&["Period", "Amount"], data));
    Ok(())
}
