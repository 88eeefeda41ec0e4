// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::Connection;

use crate::commands::{opt_decimal, req};
use crate::db::currency_for_ledger;
use crate::ledger::chart::postable_node;
use crate::ledger::transactions::{
    add_transaction, delete_transaction, note_suggestions, splits_for_transaction,
    transactions_for_account, transactions_for_category, transactions_for_keywords,
};
use crate::models::{ChartTable, SplitTransaction, Transaction, TransactionRow};
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &mut Connection, ledger: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let txn = build_transaction(conn, ledger, sub)?;
            let id = add_transaction(conn, ledger, &txn)?;
            println!("Added transaction {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").ok_or_else(|| anyhow!("missing id"))?;
            let txn = delete_transaction(conn, ledger, id)
                .with_context(|| format!("Failed to delete transaction {}", id))?;
            println!("Deleted transaction {} ({})", id, txn.notes);
        }
        Some(("list", sub)) => {
            let rows = query_rows(conn, ledger, sub)?;
            print_rows(conn, ledger, &rows, sub.get_flag("json"))?;
        }
        Some(("search", sub)) => {
            let limit = *sub.get_one::<usize>("limit").unwrap_or(&100);
            let rows = transactions_for_keywords(conn, ledger, req(sub, "keywords")?, limit)?;
            print_rows(conn, ledger, &rows, sub.get_flag("json"))?;
        }
        Some(("splits", sub)) => {
            let id = *sub.get_one::<i64>("id").ok_or_else(|| anyhow!("missing id"))?;
            let rows = splits_for_transaction(conn, ledger, id)?;
            print_rows(conn, ledger, &rows, false)?;
        }
        Some(("suggest", sub)) => {
            let keywords = sub.get_one::<String>("keywords").map(String::as_str).unwrap_or("");
            for note in note_suggestions(conn, ledger, keywords, sub.get_flag("transfers"))? {
                println!("{}", note);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Builds the transaction described by `tx add` arguments, resolving names to ids.
pub fn build_transaction(
    conn: &Connection,
    ledger: &str,
    sub: &clap::ArgMatches,
) -> Result<Transaction> {
    let date = parse_date(req(sub, "date")?)?;
    let notes = sub.get_one::<String>("notes").map(|s| s.trim()).unwrap_or("");
    let (account_id, _) = postable_node(conn, ledger, ChartTable::Accounts, req(sub, "account")?)?;

    let mut txn = match (opt_decimal(sub, "credit")?, opt_decimal(sub, "debit")?) {
        (Some(amount), None) => Transaction::credit(date, notes, amount, account_id),
        (None, Some(amount)) => Transaction::debit(date, notes, amount, account_id),
        _ => bail!("give exactly one of --credit or --debit"),
    };

    if let Some(category) = sub.get_one::<String>("category") {
        let (category_id, _) = postable_node(conn, ledger, ChartTable::Categories, category)?;
        txn = txn.in_category(category_id);
    }

    let raw_splits: Vec<&String> = sub
        .get_many::<String>("split")
        .map(|v| v.collect())
        .unwrap_or_default();
    if !raw_splits.is_empty() {
        let mut splits = Vec::with_capacity(raw_splits.len());
        for raw in raw_splits {
            let (category, amount) = raw
                .rsplit_once('=')
                .ok_or_else(|| anyhow!("split '{}' must look like CATEGORY=AMOUNT", raw))?;
            let amount = parse_decimal(amount)?;
            let (category_id, _) = postable_node(conn, ledger, ChartTable::Categories, category)?;
            let split = if txn.credit.is_zero() {
                SplitTransaction::debit(date, notes, amount, account_id)
            } else {
                SplitTransaction::credit(date, notes, amount, account_id)
            };
            splits.push(split.in_category(category_id));
        }
        txn = txn.with_splits(splits);
    }
    Ok(txn)
}

/// Rows for `tx list`: by account, by category, or the whole ledger.
pub fn query_rows(
    conn: &Connection,
    ledger: &str,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&100);
    let rows = match (
        sub.get_one::<String>("account"),
        sub.get_one::<String>("category"),
    ) {
        (_, Some(category)) => transactions_for_category(conn, ledger, category, limit)?,
        (Some(account), None) => transactions_for_account(conn, ledger, account, limit)?,
        (None, None) => transactions_for_account(conn, ledger, ".", limit)?,
    };
    Ok(rows)
}

fn print_rows(conn: &Connection, ledger: &str, rows: &[TransactionRow], json: bool) -> Result<()> {
    if maybe_print_json(json, &rows)? {
        return Ok(());
    }
    let symbol = currency_for_ledger(conn, ledger)?.symbol();
    let data = rows
        .iter()
        .map(|r| {
            vec![
                match r.parent_id {
                    Some(parent) => format!("{} ({})", r.id, parent),
                    None => r.id.to_string(),
                },
                r.date.to_string(),
                r.notes.clone(),
                r.account.clone().unwrap_or_default(),
                r.category.clone().unwrap_or_default(),
                if r.credit.is_zero() { String::new() } else { fmt_money(&r.credit, symbol) },
                if r.debit.is_zero() { String::new() } else { fmt_money(&r.debit, symbol) },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id (parent)", "Date", "Notes", "Account", "Category", "Credit", "Debit"],
            data
        )
    );
    Ok(())
}
