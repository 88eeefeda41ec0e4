// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::commands::{req, req_decimal};
use crate::db::currency_for_ledger;
use crate::ledger::chart::{add_account, aggregate_tree, build_chart, flatten};
use crate::models::{ChartKind, ChartTable, NewChartNode};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, ledger: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req(sub, "name")?;
            let kind: ChartKind = req(sub, "type")?.parse()?;
            let mut node = if sub.get_flag("placeholder") {
                NewChartNode::placeholder(name, kind)
            } else {
                NewChartNode::leaf(name, kind)
            };
            if let Some(parent) = sub.get_one::<String>("parent") {
                node = node.under(parent);
            }
            node = node.with_opening_balance(req_decimal(sub, "opening")?);
            let id = add_account(conn, ledger, &node)?;
            println!("Added account '{}' ({}) with id {}", name, kind, id);
        }
        Some(("list", sub)) => list(conn, ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, ledger: &str, sub: &clap::ArgMatches) -> Result<()> {
    let kind = sub
        .get_one::<String>("type")
        .map(|s| s.parse::<ChartKind>())
        .transpose()?;
    let mut roots = build_chart(
        conn,
        ledger,
        ChartTable::Accounts,
        kind,
        sub.get_flag("placeholders"),
    )?;
    aggregate_tree(&mut roots);
    if maybe_print_json(sub.get_flag("json"), &roots)? {
        return Ok(());
    }

    let symbol = currency_for_ledger(conn, ledger)?.symbol();
    let data = flatten(&roots)
        .into_iter()
        .map(|(depth, node)| {
            vec![
                format!("{}{}", "  ".repeat(depth), node.name),
                node.kind.to_string(),
                if node.placeholder { "yes" } else { "" }.to_string(),
                fmt_money(&node.balance, symbol),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Account", "Type", "Placeholder", "Balance"], data)
    );
    Ok(())
}
