// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::commands::{req, req_decimal};
use crate::db::currency_for_ledger;
use crate::ledger::chart::postable_node;
use crate::ledger::feeds::{fetch_gold_price, fetch_nav_quotes};
use crate::ledger::stocks::{
    action_stock_units, add_stock, fetch_stocks, find_stock, investment_summary,
    switch_stock_units, toggle_status, transactions_for_stock, update_gold_price, update_navs,
    Holding, StockSwitch,
};
use crate::models::{ChartTable, NewStock, StockKind, StockOperation, StockStatus, StockTransaction};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};

pub fn handle(conn: &mut Connection, ledger: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let stock = NewStock {
                name: req(sub, "name")?.to_string(),
                kind: req(sub, "type")?.parse()?,
                code: req(sub, "code")?.to_string(),
                plan: req(sub, "plan")?.to_string(),
            };
            let id = add_stock(conn, ledger, &stock)?;
            println!("Added stock '{}' ({}) with id {}", stock.name, stock.kind, id);
        }
        Some(("list", sub)) => list(conn, ledger, sub)?,
        Some(("toggle", sub)) => {
            let stock = find_stock(conn, ledger, req(sub, "name")?)?;
            let status = toggle_status(conn, ledger, stock.id)?;
            println!("'{}' is now {}", stock.name, status);
        }
        Some(("buy", sub)) => record(conn, ledger, sub, StockOperation::Purchase)?,
        Some(("redeem", sub)) => record(conn, ledger, sub, StockOperation::Redeem)?,
        Some(("switch", sub)) => {
            let from = find_stock(conn, ledger, req(sub, "from")?)?;
            let to = find_stock(conn, ledger, req(sub, "to")?)?;
            let sw = StockSwitch {
                from_stock_id: from.id,
                to_stock_id: to.id,
                date: parse_date(req(sub, "date")?)?,
                from_units: req_decimal(sub, "from-units")?,
                to_units: req_decimal(sub, "to-units")?,
                amount: req_decimal(sub, "amount")?,
            };
            switch_stock_units(conn, ledger, &sw)?;
            println!("Switched {} from '{}' to '{}'", sw.amount, from.name, to.name);
        }
        Some(("history", sub)) => {
            let stock = find_stock(conn, ledger, req(sub, "name")?)?;
            let rows = transactions_for_stock(conn, ledger, stock.id)?;
            if !maybe_print_json(sub.get_flag("json"), &rows)? {
                let data = rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.date.to_string(),
                            r.operation.clone(),
                            r.units.to_string(),
                            r.nav.to_string(),
                            r.amount.to_string(),
                            r.bank.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Date", "Operation", "Units", "NAV", "Amount", "Bank"], data)
                );
            }
        }
        Some(("refresh", _)) => refresh(conn, ledger)?,
        _ => {}
    }
    Ok(())
}

fn record(
    conn: &mut Connection,
    ledger: &str,
    sub: &clap::ArgMatches,
    operation: StockOperation,
) -> Result<()> {
    let stock = find_stock(conn, ledger, req(sub, "stock")?)?;
    let bank_account_id = match sub.get_one::<String>("bank") {
        Some(name) => Some(postable_node(conn, ledger, ChartTable::Accounts, name)?.0),
        None => None,
    };
    let op = StockTransaction {
        operation,
        stock_id: stock.id,
        date: parse_date(req(sub, "date")?)?,
        units: req_decimal(sub, "units")?,
        nav: req_decimal(sub, "nav")?,
        amount: req_decimal(sub, "amount")?,
        bank_account_id,
    };
    let outcome = action_stock_units(conn, ledger, &op)
        .with_context(|| format!("Failed to record {} of '{}'", op.operation, stock.name))?;
    match outcome.cash_transaction_id {
        Some(id) => println!(
            "Recorded {} of {} units in '{}' (cash transaction {})",
            op.operation, op.units, stock.name, id
        ),
        None => println!("Recorded {} of {} units in '{}'", op.operation, op.units, stock.name),
    }
    Ok(())
}

fn list(conn: &Connection, ledger: &str, sub: &clap::ArgMatches) -> Result<()> {
    let status = sub
        .get_one::<String>("status")
        .map(|s| s.parse::<StockStatus>())
        .transpose()?;
    let stocks = fetch_stocks(conn, ledger, status)?;
    if maybe_print_json(sub.get_flag("json"), &stocks)? {
        return Ok(());
    }
    let symbol = currency_for_ledger(conn, ledger)?.symbol();
    let pct = |p: Option<Decimal>| p.map(|p| format!("{}%", p)).unwrap_or_default();

    let mut data = Vec::with_capacity(stocks.len());
    for s in &stocks {
        data.push(vec![
            s.name.clone(),
            s.kind.to_string(),
            s.status.to_string(),
            s.units.to_string(),
            format!("{} ({})", s.nav, s.nav_date),
            fmt_money(&s.invested, symbol),
            fmt_money(&s.value()?, symbol),
            pct(s.change_pct()?),
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["Stock", "Type", "Status", "Units", "NAV", "Invested", "Value", "Change"],
            data
        )
    );

    let summary = investment_summary(&stocks)?;
    let row = |label: &str, h: &Holding| -> Result<Vec<String>> {
        Ok(vec![
            label.to_string(),
            fmt_money(&h.invested, symbol),
            fmt_money(&h.value, symbol),
            pct(h.change_pct()?),
        ])
    };
    println!(
        "{}",
        pretty_table(
            &["Kind", "Invested", "Value", "Change"],
            vec![
                row(StockKind::MutualFund.as_str(), &summary.mutual_fund)?,
                row(StockKind::Gold.as_str(), &summary.gold)?,
                row(StockKind::Other.as_str(), &summary.others)?,
            ]
        )
    );
    Ok(())
}

fn refresh(conn: &mut Connection, ledger: &str) -> Result<()> {
    let stocks = fetch_stocks(conn, ledger, None)?;
    let codes: Vec<String> = stocks
        .iter()
        .filter(|s| s.kind == StockKind::MutualFund && !s.code.is_empty())
        .map(|s| s.code.clone())
        .collect();
    if !codes.is_empty() {
        let quotes = fetch_nav_quotes(&codes).context("Failed to fetch NAVs")?;
        let updated = update_navs(conn, ledger, &quotes)?;
        println!("Updated NAV of {} mutual fund(s)", updated);
    }
    if stocks.iter().any(|s| s.kind == StockKind::Gold) {
        let (price, date) = fetch_gold_price().context("Failed to fetch the gold price")?;
        let updated = update_gold_price(conn, ledger, price, &date)?;
        println!("Updated gold price to {} ({}) on {} stock(s)", price, date, updated);
    }
    Ok(())
}
