// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::commands::req;
use crate::ledger::chart::{add_category, build_chart, flatten};
use crate::models::{ChartKind, ChartTable, NewChartNode};
use crate::utils::{maybe_print_json, pretty_table};

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
            let id = add_category(conn, ledger, &node)?;
            println!("Added category '{}' ({}) with id {}", name, kind, id);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("type")
                .map(|s| s.parse::<ChartKind>())
                .transpose()?;
            let roots = build_chart(
                conn,
                ledger,
                ChartTable::Categories,
                kind,
                sub.get_flag("placeholders"),
            )?;
            if !maybe_print_json(sub.get_flag("json"), &roots)? {
                let data = flatten(&roots)
                    .into_iter()
                    .map(|(depth, node)| {
                        vec![
                            format!("{}{}", "  ".repeat(depth), node.name),
                            node.kind.to_string(),
                            if node.placeholder { "yes" } else { "" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Type", "Placeholder"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
