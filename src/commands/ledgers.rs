// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::commands::req;
use crate::db::{create_ledger, fetch_ledgers, set_default_ledger};
use crate::models::Currency;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req(sub, "name")?;
            let currency: Currency = req(sub, "currency")?.parse()?;
            let ledger = create_ledger(conn, name, currency)
                .with_context(|| format!("Failed to create ledger '{}'", name))?;
            println!("Created ledger '{}' ({})", ledger.name, ledger.currency);
        }
        Some(("list", sub)) => {
            let ledgers = fetch_ledgers(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &ledgers)? {
                let data = ledgers
                    .iter()
                    .map(|l| vec![l.name.clone(), l.currency.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Ledger", "Currency"], data));
            }
        }
        Some(("use", sub)) => {
            let name = req(sub, "name")?;
            set_default_ledger(conn, name)?;
            println!("Default ledger set to '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
