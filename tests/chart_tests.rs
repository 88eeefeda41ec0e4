// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::LedgerError;
use pocketledger::db::{create_ledger, open_in_memory};
use pocketledger::ledger::chart::{
    add_account, add_category, aggregate_tree, balance_of, build_chart, find_node, flatten,
    leaf_ids, postable_node, resolve_balance,
};
use pocketledger::models::{ChartKind, ChartTable, Currency, NewChartNode};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn setup() -> Connection {
    let mut conn = open_in_memory().unwrap();
    create_ledger(&mut conn, "home", Currency::Gbp).unwrap();
    add_account(&conn, "home", &NewChartNode::placeholder("Bank", ChartKind::Asset)).unwrap();
    add_account(
        &conn,
        "home",
        &NewChartNode::leaf("Checking", ChartKind::Asset)
            .under("Bank")
            .with_opening_balance(dec("100.00")),
    )
    .unwrap();
    add_account(
        &conn,
        "home",
        &NewChartNode::placeholder("Savings", ChartKind::Asset).under("Bank"),
    )
    .unwrap();
    add_account(
        &conn,
        "home",
        &NewChartNode::leaf("ISA", ChartKind::Asset)
            .under("Savings")
            .with_opening_balance(dec("250.50")),
    )
    .unwrap();
    add_account(
        &conn,
        "home",
        &NewChartNode::leaf("Credit Card", ChartKind::Liability).with_opening_balance(dec("-40.00")),
    )
    .unwrap();
    conn
}

#[test]
fn placeholders_sum_their_descendants() {
    let conn = setup();
    let mut roots = build_chart(&conn, "home", ChartTable::Accounts, None, false).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].name, "Bank");
    assert_eq!(roots[1].name, "Credit Card");

    assert_eq!(balance_of(&roots, "Bank"), Some(dec("350.50")));
    assert_eq!(balance_of(&roots, "Savings"), Some(dec("250.50")));
    assert_eq!(balance_of(&roots, "Missing"), None);

    aggregate_tree(&mut roots);
    for (_, node) in flatten(&roots) {
        if node.placeholder {
            let children: Decimal = node.children.iter().map(|c| c.balance).sum();
            assert_eq!(node.balance, children, "placeholder {}", node.name);
        }
        assert_eq!(node.balance, resolve_balance(node));
    }
}

#[test]
fn tree_shape_and_leaf_expansion() {
    let conn = setup();
    let roots = build_chart(&conn, "home", ChartTable::Accounts, None, false).unwrap();
    let listing: Vec<(usize, &str)> = flatten(&roots)
        .into_iter()
        .map(|(depth, n)| (depth, n.name.as_str()))
        .collect();
    assert_eq!(
        listing,
        vec![
            (0, "Bank"),
            (1, "Checking"),
            (1, "Savings"),
            (2, "ISA"),
            (0, "Credit Card"),
        ]
    );

    let bank = find_node(&roots, "Bank").unwrap();
    let checking = find_node(&roots, "Checking").unwrap();
    let isa = find_node(&roots, "ISA").unwrap();
    assert_eq!(leaf_ids(bank), vec![checking.id, isa.id]);
    assert_eq!(leaf_ids(checking), vec![checking.id]);
}

#[test]
fn filters_by_kind_and_placeholder() {
    let conn = setup();
    let liabilities =
        build_chart(&conn, "home", ChartTable::Accounts, Some(ChartKind::Liability), false).unwrap();
    assert_eq!(liabilities.len(), 1);
    assert_eq!(liabilities[0].name, "Credit Card");

    let groups = build_chart(&conn, "home", ChartTable::Accounts, None, true).unwrap();
    let names: Vec<&str> = flatten(&groups).into_iter().map(|(_, n)| n.name.as_str()).collect();
    assert_eq!(names, vec!["Bank", "Savings"]);

    let err = build_chart(&conn, "home", ChartTable::Accounts, Some(ChartKind::Income), false)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
}

#[test]
fn leaf_accounts_carry_opening_plus_postings() {
    let conn = setup();
    conn.execute(
        "UPDATE home_accounts SET balance='-12.25' WHERE name='Checking'",
        [],
    )
    .unwrap();
    let roots = build_chart(&conn, "home", ChartTable::Accounts, None, false).unwrap();
    let checking = find_node(&roots, "Checking").unwrap();
    assert_eq!(checking.opening_balance, dec("100.00"));
    assert_eq!(checking.balance, dec("87.75"));
}

#[test]
fn parents_must_be_placeholders_of_the_same_kind() {
    let conn = setup();
    let cases = [
        NewChartNode::leaf("Orphan", ChartKind::Asset).under("Nowhere"),
        NewChartNode::leaf("Sub", ChartKind::Asset).under("Checking"),
        NewChartNode::leaf("Loan", ChartKind::Liability).under("Bank"),
    ];
    for node in cases {
        let err = add_account(&conn, "home", &node).unwrap_err();
        assert!(
            matches!(err, LedgerError::ConstraintViolation(_)),
            "{} should be rejected, got {:?}",
            node.name,
            err
        );
    }
}

#[test]
fn node_validation() {
    let conn = setup();
    let err = add_account(
        &conn,
        "home",
        &NewChartNode::placeholder("Cash", ChartKind::Asset).with_opening_balance(dec("5")),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));

    let err = add_account(&conn, "home", &NewChartNode::leaf("Salary", ChartKind::Income))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));

    let err = add_account(&conn, "home", &NewChartNode::leaf("Checking", ChartKind::Asset))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ConstraintViolation(_)));

    let err = add_account(&conn, "away", &NewChartNode::leaf("Cash", ChartKind::Asset))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn categories_form_their_own_tree() {
    let conn = setup();
    add_category(&conn, "home", &NewChartNode::placeholder("Bills", ChartKind::Expense)).unwrap();
    add_category(&conn, "home", &NewChartNode::leaf("Rent", ChartKind::Expense).under("Bills"))
        .unwrap();
    add_category(&conn, "home", &NewChartNode::leaf("Salary", ChartKind::Income)).unwrap();

    let roots = build_chart(&conn, "home", ChartTable::Categories, None, false).unwrap();
    let names: Vec<&str> = roots.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Bills", "Salary"]);
    assert_eq!(roots[0].children[0].name, "Rent");
    assert_eq!(resolve_balance(&roots[0]), Decimal::ZERO);

    let (_, kind) = postable_node(&conn, "home", ChartTable::Categories, "Rent").unwrap();
    assert_eq!(kind, ChartKind::Expense);
    assert!(matches!(
        postable_node(&conn, "home", ChartTable::Categories, "Bills"),
        Err(LedgerError::ConstraintViolation(_))
    ));
    assert!(matches!(
        postable_node(&conn, "home", ChartTable::Accounts, "Rent"),
        Err(LedgerError::NotFound(_))
    ));
}
