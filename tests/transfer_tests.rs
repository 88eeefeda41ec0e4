// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::LedgerError;
use pocketledger::db::{create_ledger, open_in_memory};
use pocketledger::ledger::chart::{add_account, add_category, balance_of, build_chart, postable_node};
use pocketledger::ledger::transactions::{get_transaction, transactions_for_category};
use pocketledger::ledger::transfer::{
    FEE_NOTES, TransferFee, TransferRequest, prepare_transfer, transfer_funds,
};
use pocketledger::models::{ChartKind, ChartTable, Currency, NewChartNode, Transaction};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn balance(conn: &Connection, ledger: &str, account: &str) -> Decimal {
    let roots = build_chart(conn, ledger, ChartTable::Accounts, None, false).unwrap();
    balance_of(&roots, account).unwrap()
}

fn setup() -> Connection {
    let mut conn = open_in_memory().unwrap();
    create_ledger(&mut conn, "uk", Currency::Gbp).unwrap();
    create_ledger(&mut conn, "india", Currency::Inr).unwrap();
    for (name, opening) in [("Checking", "100.00"), ("Savings", "20.00")] {
        add_account(
            &conn,
            "uk",
            &NewChartNode::leaf(name, ChartKind::Asset).with_opening_balance(dec(opening)),
        )
        .unwrap();
    }
    add_account(&conn, "india", &NewChartNode::leaf("Savings", ChartKind::Asset)).unwrap();
    add_category(&conn, "uk", &NewChartNode::leaf("Bank Charges", ChartKind::Expense)).unwrap();
    add_category(&conn, "uk", &NewChartNode::leaf("Interest", ChartKind::Income)).unwrap();
    conn
}

#[test]
fn local_transfer_keeps_the_total() {
    let mut conn = setup();
    let mut req = TransferRequest::local("uk", "Checking", "Savings", day("2026-10-01"), dec("40.00"));
    req.notes = "rainy day".into();
    let before = balance(&conn, "uk", "Checking") + balance(&conn, "uk", "Savings");

    let legs = prepare_transfer(&conn, &req).unwrap();
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].notes, "<trans> Checking -> Savings [ rainy day ]");
    assert_eq!(legs[0].notes, legs[1].notes);
    assert_eq!(legs[0].category_id, None);

    let [from_id, to_id] = transfer_funds(&mut conn, "uk", "uk", &legs).unwrap();
    assert_ne!(from_id, to_id);
    assert_eq!(balance(&conn, "uk", "Checking"), dec("60.00"));
    assert_eq!(balance(&conn, "uk", "Savings"), dec("60.00"));
    assert_eq!(
        balance(&conn, "uk", "Checking") + balance(&conn, "uk", "Savings"),
        before
    );
}

#[test]
fn cross_ledger_transfer_with_fee() {
    let mut conn = setup();
    let req = TransferRequest {
        from_ledger: "uk".into(),
        to_ledger: "india".into(),
        from_account: "Checking".into(),
        to_account: "Savings".into(),
        date: day("2026-10-02"),
        amount: dec("50.00"),
        received: Some(dec("5500.00")),
        fee: Some(TransferFee {
            amount: dec("2.50"),
            category: "Bank Charges".into(),
        }),
        notes: String::new(),
    };
    let legs = prepare_transfer(&conn, &req).unwrap();
    assert_eq!(legs[0].notes, "<trans><split> Checking (uk) -> Savings (india)");
    assert_eq!(legs[1].notes, "<trans> Checking (uk) -> Savings (india)");
    assert_eq!(legs[0].debit, dec("52.50"));
    assert_eq!(legs[1].credit, dec("5500.00"));

    let [from_id, _] = transfer_funds(&mut conn, "uk", "india", &legs).unwrap();
    assert_eq!(balance(&conn, "uk", "Checking"), dec("47.50"));
    assert_eq!(balance(&conn, "india", "Savings"), dec("5500.00"));

    let from = get_transaction(&conn, "uk", from_id).unwrap();
    assert!(from.is_split);
    assert_eq!(from.splits.len(), 2);
    assert_eq!(from.splits[0].category_id, None);
    assert_eq!(from.splits[0].debit, dec("50.00"));
    assert_eq!(from.splits[1].notes, FEE_NOTES);
    let net: Decimal = from.splits.iter().map(|s| s.net()).sum();
    assert_eq!(net, from.net());

    let charges = transactions_for_category(&conn, "uk", "Bank Charges", 10).unwrap();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].debit, dec("2.50"));
}

#[test]
fn same_currency_fee_reduces_the_pair_by_the_fee() {
    let mut conn = setup();
    let mut req = TransferRequest::local("uk", "Checking", "Savings", day("2026-10-03"), dec("10.00"));
    req.fee = Some(TransferFee {
        amount: dec("0.75"),
        category: "Bank Charges".into(),
    });
    let before = balance(&conn, "uk", "Checking") + balance(&conn, "uk", "Savings");
    let legs = prepare_transfer(&conn, &req).unwrap();
    transfer_funds(&mut conn, "uk", "uk", &legs).unwrap();
    let after = balance(&conn, "uk", "Checking") + balance(&conn, "uk", "Savings");
    assert_eq!(before - after, dec("0.75"));
}

#[test]
fn invalid_requests_are_rejected() {
    let conn = setup();
    let base = TransferRequest::local("uk", "Checking", "Savings", day("2026-10-04"), dec("10.00"));

    let same = TransferRequest {
        to_account: "Checking".into(),
        ..base.clone()
    };
    assert!(matches!(
        prepare_transfer(&conn, &same),
        Err(LedgerError::InvalidArgument(_))
    ));

    let negative = TransferRequest {
        amount: dec("-1"),
        ..base.clone()
    };
    assert!(matches!(
        prepare_transfer(&conn, &negative),
        Err(LedgerError::InvalidArgument(_))
    ));

    let income_fee = TransferRequest {
        fee: Some(TransferFee {
            amount: dec("1"),
            category: "Interest".into(),
        }),
        ..base.clone()
    };
    assert!(matches!(
        prepare_transfer(&conn, &income_fee),
        Err(LedgerError::ConstraintViolation(_))
    ));

    let unknown = TransferRequest {
        to_ledger: "france".into(),
        ..base
    };
    assert!(matches!(
        prepare_transfer(&conn, &unknown),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn transfers_need_exactly_two_legs_and_are_atomic() {
    let mut conn = setup();
    let (checking, _) = postable_node(&conn, "uk", ChartTable::Accounts, "Checking").unwrap();
    let d = day("2026-10-05");
    let out = Transaction::debit(d, "<trans> out", dec("5.00"), checking);

    let err = transfer_funds(&mut conn, "uk", "uk", std::slice::from_ref(&out)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));

    let broken = vec![out.clone(), Transaction::credit(d, "<trans> in", dec("5.00"), 9999)];
    let err = transfer_funds(&mut conn, "uk", "india", &broken).unwrap_err();
    assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    assert_eq!(balance(&conn, "uk", "Checking"), dec("100.00"));
}
