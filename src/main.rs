// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use pocketledger::{cli, commands, db, utils};

fn working_ledger(conn: &Connection, matches: &clap::ArgMatches) -> Result<String> {
    if let Some(name) = matches.get_one::<String>("ledger") {
        return Ok(name.trim().to_string());
    }
    db::get_default_ledger(conn)?.ok_or_else(|| {
        anyhow!("no ledger selected: pass --ledger or run `pocketledger ledger use <name>`")
    })
}

fn main() -> Result<()> {
    utils::init_tracing();
    let matches = cli::build_cli().get_matches();

    let path = db::db_path(matches.get_one::<String>("db").map(PathBuf::from).as_deref())?;
    let mut conn = db::open_or_init(&path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("ledger", sub)) => commands::ledgers::handle(&mut conn, sub)?,
        Some(("backup", sub)) => {
            drop(conn);
            commands::backup::handle(&path, sub)?;
        }
        Some((name, sub)) => {
            let ledger = working_ledger(&conn, &matches)?;
            match name {
                "account" => commands::accounts::handle(&conn, &ledger, sub)?,
                "category" => commands::categories::handle(&conn, &ledger, sub)?,
                "tx" => commands::transactions::handle(&mut conn, &ledger, sub)?,
                "stock" => commands::stocks::handle(&mut conn, &ledger, sub)?,
                "transfer" => commands::transfers::handle(&mut conn, &ledger, sub)?,
                "stats" => commands::stats::handle(&conn, &ledger, sub)?,
                _ => {}
            }
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
