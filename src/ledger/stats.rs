// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Income and expense totals bucketed by month or year.

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params_from_iter, types::Value};
use rust_decimal::Decimal;

use crate::db::LedgerTables;
use crate::error::{LedgerError, Result};
use crate::ledger::chart::resolve_filter_ids;
use crate::models::{ChartKind, ChartTable, Period, StatsPoint};
use crate::utils::decimal_col;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsTarget {
    /// One category, or every leaf under a placeholder category.
    Category(String),
    /// Every categorised posting of the given kind.
    Kind(ChartKind),
}

/// A contiguous run of buckets ending with the one that contains `as_of`.
struct Buckets {
    labels: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_start(index: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

fn buckets(period: Period, count: usize, as_of: NaiveDate) -> Result<Buckets> {
    let out_of_range = || LedgerError::invalid(format!("cannot go back {} periods from {}", count, as_of));
    let span = i32::try_from(count).map_err(|_| out_of_range())?;
    match period {
        Period::Monthly => {
            let last = month_index(as_of);
            let first = last - span + 1;
            let labels = (first..=last)
                .map(|i| month_start(i).map(|d| d.format("%Y-%m").to_string()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(out_of_range)?;
            Ok(Buckets {
                labels,
                start: month_start(first).ok_or_else(out_of_range)?,
                end: month_start(last + 1).ok_or_else(out_of_range)?,
            })
        }
        Period::Yearly => {
            let last = as_of.year();
            let first = last - span + 1;
            let start = NaiveDate::from_ymd_opt(first, 1, 1).ok_or_else(out_of_range)?;
            let end = NaiveDate::from_ymd_opt(last + 1, 1, 1).ok_or_else(out_of_range)?;
            Ok(Buckets {
                labels: (first..=last).map(|y| format!("{:04}", y)).collect(),
                start,
                end,
            })
        }
    }
}

/// Resolves the target to the category ids it covers and the kind that picks
/// the summed column. `None` covers every categorised row of the ledger.
fn target_categories(
    conn: &Connection,
    ledger: &str,
    target: &StatsTarget,
) -> Result<(Option<Vec<i64>>, ChartKind)> {
    match target {
        StatsTarget::Category(name) => {
            let (node, ids) = resolve_filter_ids(conn, ledger, ChartTable::Categories, name)?
                .ok_or_else(|| LedgerError::invalid("a category name is required"))?;
            Ok((Some(ids), node.kind))
        }
        StatsTarget::Kind(kind) => {
            if kind.table() != ChartTable::Categories {
                return Err(LedgerError::invalid(format!(
                    "stats are kept for income and expense, not {}",
                    kind
                )));
            }
            Ok((None, *kind))
        }
    }
}

/// Totals per period, oldest first, always `count` entries long.
///
/// Income targets sum credits and expense targets debits, across plain and
/// split rows. A kind target covers every categorised row, whatever the
/// category's own kind. Rows without a category never count.
pub fn period_series(
    conn: &Connection,
    ledger: &str,
    target: &StatsTarget,
    period: Period,
    count: usize,
    as_of: NaiveDate,
) -> Result<Vec<StatsPoint>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    let b = buckets(period, count, as_of)?;
    let mut totals = vec![Decimal::ZERO; b.labels.len()];

    let (ids, kind) = target_categories(conn, ledger, target)?;
    if ids.as_ref().is_none_or(|ids| !ids.is_empty()) {
        let column = match kind {
            ChartKind::Income => "credit",
            _ => "debit",
        };
        let filter = match &ids {
            Some(ids) => format!("category_id IN ({})", vec!["?"; ids.len()].join(", ")),
            None => "category_id IS NOT NULL".to_string(),
        };
        let sql = format!(
            "SELECT date, {col} FROM {txn} WHERE {filter} AND date >= ? AND date < ?
             UNION ALL
             SELECT date, {col} FROM {spl} WHERE {filter} AND date >= ? AND date < ?",
            col = column,
            txn = t.transactions,
            spl = t.splits,
            filter = filter,
        );
        let mut values: Vec<Value> = Vec::new();
        for _ in 0..2 {
            if let Some(ids) = &ids {
                values.extend(ids.iter().copied().map(Value::Integer));
            }
            values.push(Value::Text(b.start.format("%F").to_string()));
            values.push(Value::Text(b.end.format("%F").to_string()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |r| {
            Ok((r.get::<_, NaiveDate>(0)?, decimal_col(r, 1)?))
        })?;
        for row in rows {
            let (date, amount) = row?;
            let slot = match period {
                Period::Monthly => month_index(date) - month_index(b.start),
                Period::Yearly => date.year() - b.start.year(),
            };
            if let Some(total) = usize::try_from(slot).ok().and_then(|i| totals.get_mut(i)) {
                *total += amount;
            }
        }
    }

    Ok(b
        .labels
        .into_iter()
        .zip(totals)
        .map(|(period, amount)| StatsPoint {
            period,
            amount: amount.round_dp(2),
        })
        .collect())
}
