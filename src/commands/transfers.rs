// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::commands::{opt_decimal, req, req_decimal};
use crate::ledger::transfer::{TransferFee, TransferRequest, prepare_transfer, transfer_funds};
use crate::utils::parse_date;

pub fn handle(conn: &mut Connection, ledger: &str, m: &clap::ArgMatches) -> Result<()> {
    let request = match m.subcommand() {
        Some(("local", sub)) => {
            let mut request = TransferRequest::local(
                ledger,
                req(sub, "from")?,
                req(sub, "to")?,
                parse_date(req(sub, "date")?)?,
                req_decimal(sub, "amount")?,
            );
            request.notes = req(sub, "notes")?.to_string();
            request
        }
        Some(("cross", sub)) => cross_request(ledger, sub)?,
        _ => return Ok(()),
    };
    let legs = prepare_transfer(conn, &request)?;
    let [from_id, to_id] = transfer_funds(conn, &request.from_ledger, &request.to_ledger, &legs)?;
    println!("{} (transactions {} and {})", legs[1].notes, from_id, to_id);
    Ok(())
}

fn cross_request(ledger: &str, sub: &clap::ArgMatches) -> Result<TransferRequest> {
    let fee = match opt_decimal(sub, "fee")? {
        Some(amount) => Some(TransferFee {
            amount,
            category: sub
                .get_one::<String>("fee-category")
                .cloned()
                .ok_or_else(|| anyhow!("--fee needs --fee-category"))?,
        }),
        None => None,
    };
    Ok(TransferRequest {
        from_ledger: ledger.to_string(),
        to_ledger: req(sub, "to-ledger")?.to_string(),
        from_account: req(sub, "from")?.to_string(),
        to_account: req(sub, "to")?.to_string(),
        date: parse_date(req(sub, "date")?)?,
        amount: req_decimal(sub, "amount")?,
        received: opt_decimal(sub, "received")?,
        fee,
        notes: req(sub, "notes")?.to_string(),
    })
}
