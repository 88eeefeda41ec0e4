// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::cli;

#[test]
fn global_ledger_flag_is_seen_at_the_top_level() {
    let matches = cli::build_cli()
        .try_get_matches_from(["pocketledger", "stats", "--ledger", "uk", "--count", "3"])
        .unwrap();
    assert_eq!(matches.get_one::<String>("ledger").map(String::as_str), Some("uk"));
    let Some(("stats", stats)) = matches.subcommand() else {
        panic!("no stats subcommand");
    };
    assert_eq!(stats.get_one::<usize>("count"), Some(&3));
    assert_eq!(stats.get_one::<String>("kind").map(String::as_str), Some("expense"));
}

#[test]
fn credit_and_debit_are_exclusive() {
    let res = cli::build_cli().try_get_matches_from([
        "pocketledger",
        "tx",
        "add",
        "--date",
        "2026-10-01",
        "--account",
        "Checking",
        "--credit",
        "1",
        "--debit",
        "1",
    ]);
    assert!(res.is_err());
}

#[test]
fn fee_requires_a_category() {
    let base = [
        "pocketledger",
        "transfer",
        "cross",
        "--to-ledger",
        "india",
        "--from",
        "Checking",
        "--to",
        "Savings",
        "--date",
        "2026-10-01",
        "--amount",
        "50",
        "--fee",
        "2",
    ];
    assert!(cli::build_cli().try_get_matches_from(base).is_err());

    let mut with_category = base.to_vec();
    with_category.extend(["--fee-category", "Bank Charges"]);
    assert!(cli::build_cli().try_get_matches_from(with_category).is_ok());
}

#[test]
fn stock_buy_takes_an_optional_bank() {
    let matches = cli::build_cli()
        .try_get_matches_from([
            "pocketledger",
            "stock",
            "buy",
            "Bluechip",
            "--date",
            "2026-10-01",
            "--units",
            "10",
            "--nav",
            "100",
            "--amount",
            "1000",
        ])
        .unwrap();
    let Some(("stock", stock)) = matches.subcommand() else {
        panic!("no stock subcommand");
    };
    let Some(("buy", buy)) = stock.subcommand() else {
        panic!("no buy subcommand");
    };
    assert_eq!(buy.get_one::<String>("stock").map(String::as_str), Some("Bluechip"));
    assert_eq!(buy.get_one::<String>("bank"), None);
}
