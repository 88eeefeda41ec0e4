// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::LedgerError;
use pocketledger::db::{create_ledger, open_in_memory};
use pocketledger::ledger::chart::{add_account, add_category, postable_node};
use pocketledger::ledger::stats::{StatsTarget, period_series};
use pocketledger::ledger::transactions::add_transaction;
use pocketledger::models::{
    ChartKind, ChartTable, Currency, NewChartNode, Period, SplitTransaction, Transaction,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn amounts(points: &[pocketledger::models::StatsPoint]) -> Vec<Decimal> {
    points.iter().map(|p| p.amount).collect()
}

fn setup() -> Connection {
    let mut conn = open_in_memory().unwrap();
    create_ledger(&mut conn, "test", Currency::Usd).unwrap();
    add_account(&conn, "test", &NewChartNode::leaf("Checking", ChartKind::Asset)).unwrap();
    add_account(&conn, "test", &NewChartNode::leaf("Savings", ChartKind::Asset)).unwrap();
    add_category(&conn, "test", &NewChartNode::leaf("Salary", ChartKind::Income)).unwrap();
    add_category(&conn, "test", &NewChartNode::placeholder("Home", ChartKind::Expense)).unwrap();
    add_category(&conn, "test", &NewChartNode::leaf("Rent", ChartKind::Expense).under("Home"))
        .unwrap();
    add_category(
        &conn,
        "test",
        &NewChartNode::leaf("Utilities", ChartKind::Expense).under("Home"),
    )
    .unwrap();
    add_category(&conn, "test", &NewChartNode::leaf("Food", ChartKind::Expense)).unwrap();
    conn
}

fn post(conn: &mut Connection, txn: Transaction) {
    add_transaction(conn, "test", &txn).unwrap();
}

fn id(conn: &Connection, table: ChartTable, name: &str) -> i64 {
    postable_node(conn, "test", table, name).unwrap().0
}

fn seed(conn: &mut Connection) {
    let checking = id(conn, ChartTable::Accounts, "Checking");
    let savings = id(conn, ChartTable::Accounts, "Savings");
    let salary = id(conn, ChartTable::Categories, "Salary");
    let rent = id(conn, ChartTable::Categories, "Rent");
    let utilities = id(conn, ChartTable::Categories, "Utilities");
    let food = id(conn, ChartTable::Categories, "Food");

    post(conn, Transaction::credit(day("2025-12-28"), "pay", dec("900.00"), checking).in_category(salary));
    post(conn, Transaction::credit(day("2026-01-28"), "pay", dec("1000.00"), checking).in_category(salary));
    post(conn, Transaction::debit(day("2026-01-05"), "rent", dec("400.00"), checking).in_category(rent));
    post(conn, Transaction::debit(day("2026-03-02"), "food", dec("12.35"), checking).in_category(food));
    let d = day("2026-03-05");
    post(
        conn,
        Transaction::debit(d, "bills", dec("430.00"), checking).with_splits(vec![
            SplitTransaction::debit(d, "rent", dec("400.00"), checking).in_category(rent),
            SplitTransaction::debit(d, "power", dec("30.00"), checking).in_category(utilities),
        ]),
    );
    post(conn, Transaction::debit(day("2026-03-06"), "<trans> Checking -> Savings", dec("50.00"), checking));
    post(conn, Transaction::credit(day("2026-03-06"), "<trans> Checking -> Savings", dec("50.00"), savings));
    post(conn, Transaction::debit(day("2026-04-01"), "rent", dec("400.00"), checking).in_category(rent));
}

#[test]
fn empty_ledger_yields_zero_filled_buckets() {
    let conn = setup();
    let series = period_series(
        &conn,
        "test",
        &StatsTarget::Kind(ChartKind::Expense),
        Period::Monthly,
        3,
        day("2026-10-19"),
    )
    .unwrap();
    assert_eq!(series.len(), 3);
    assert!(series.iter().all(|p| p.amount.is_zero()));
    let labels: Vec<&str> = series.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(labels, vec!["2026-08", "2026-09", "2026-10"]);
}

#[test]
fn expense_kind_sums_plain_and_split_rows() {
    let mut conn = setup();
    seed(&mut conn);
    let series = period_series(
        &conn,
        "test",
        &StatsTarget::Kind(ChartKind::Expense),
        Period::Monthly,
        3,
        day("2026-03-31"),
    )
    .unwrap();
    let labels: Vec<&str> = series.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(labels, vec!["2026-01", "2026-02", "2026-03"]);
    assert_eq!(amounts(&series), vec![dec("400.00"), Decimal::ZERO, dec("442.35")]);
}

#[test]
fn placeholder_category_covers_its_leaves() {
    let mut conn = setup();
    seed(&mut conn);
    let home = period_series(
        &conn,
        "test",
        &StatsTarget::Category("Home".into()),
        Period::Monthly,
        4,
        day("2026-04-15"),
    )
    .unwrap();
    assert_eq!(
        amounts(&home),
        vec![dec("400.00"), Decimal::ZERO, dec("430.00"), dec("400.00")]
    );

    let utilities = period_series(
        &conn,
        "test",
        &StatsTarget::Category("Utilities".into()),
        Period::Monthly,
        4,
        day("2026-04-15"),
    )
    .unwrap();
    assert_eq!(
        amounts(&utilities),
        vec![Decimal::ZERO, Decimal::ZERO, dec("30.00"), Decimal::ZERO]
    );
}

#[test]
fn income_sums_credits_per_year() {
    let mut conn = setup();
    seed(&mut conn);
    let series = period_series(
        &conn,
        "test",
        &StatsTarget::Category("Salary".into()),
        Period::Yearly,
        3,
        day("2026-06-30"),
    )
    .unwrap();
    let labels: Vec<&str> = series.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(labels, vec!["2024", "2025", "2026"]);
    assert_eq!(
        amounts(&series),
        vec![Decimal::ZERO, dec("900.00"), dec("1000.00")]
    );

    let income = period_series(
        &conn,
        "test",
        &StatsTarget::Kind(ChartKind::Income),
        Period::Yearly,
        1,
        day("2026-06-30"),
    )
    .unwrap();
    assert_eq!(amounts(&income), vec![dec("1000.00")]);
}

#[test]
fn bad_targets_are_rejected() {
    let conn = setup();
    let as_of = day("2026-10-19");
    assert!(matches!(
        period_series(&conn, "test", &StatsTarget::Kind(ChartKind::Asset), Period::Monthly, 3, as_of),
        Err(LedgerError::InvalidArgument(_))
    ));
    assert!(matches!(
        period_series(&conn, "test", &StatsTarget::Category("Travel".into()), Period::Monthly, 3, as_of),
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        period_series(&conn, "test", &StatsTarget::Category(".".into()), Period::Monthly, 3, as_of),
        Err(LedgerError::InvalidArgument(_))
    ));
    assert!(
        period_series(&conn, "test", &StatsTarget::Kind(ChartKind::Expense), Period::Monthly, 0, as_of)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn kind_series_cover_every_categorised_row() {
    let mut conn = setup();
    let checking = id(&conn, ChartTable::Accounts, "Checking");
    let rent = id(&conn, ChartTable::Categories, "Rent");
    let salary = id(&conn, ChartTable::Categories, "Salary");
    post(&mut conn, Transaction::credit(day("2026-10-02"), "rent refund", dec("20.00"), checking).in_category(rent));
    post(&mut conn, Transaction::debit(day("2026-10-03"), "payroll correction", dec("5.00"), checking).in_category(salary));
    post(&mut conn, Transaction::credit(day("2026-10-04"), "cash found", dec("7.00"), checking));

    let as_of = day("2026-10-19");
    let income = period_series(&conn, "test", &StatsTarget::Kind(ChartKind::Income), Period::Monthly, 1, as_of)
        .unwrap();
    assert_eq!(amounts(&income), vec![dec("20.00")]);
    let expense = period_series(&conn, "test", &StatsTarget::Kind(ChartKind::Expense), Period::Monthly, 1, as_of)
        .unwrap();
    assert_eq!(amounts(&expense), vec![dec("5.00")]);
}
