// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::db::LedgerTables;
use crate::error::{LedgerError, Result};
use crate::ledger::chart::postable_node;
use crate::ledger::transactions::{SPLIT_TAG, TRANSFER_TAG, insert_transaction};
use crate::models::{ChartKind, ChartTable, SplitTransaction, Transaction};

pub const FEE_NOTES: &str = "fund transfer charge";

#[derive(Debug, Clone)]
pub struct TransferFee {
    pub amount: Decimal,
    /// Leaf expense category in the sending ledger.
    pub category: String,
}

/// A transfer between two accounts, possibly in different ledgers.
///
/// `received` is what lands in the destination account; it defaults to
/// `amount` and only differs when the ledgers use different currencies.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_ledger: String,
    pub to_ledger: String,
    pub from_account: String,
    pub to_account: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub received: Option<Decimal>,
    pub fee: Option<TransferFee>,
    pub notes: String,
}

impl TransferRequest {
    pub fn local(ledger: &str, from: &str, to: &str, date: NaiveDate, amount: Decimal) -> Self {
        TransferRequest {
            from_ledger: ledger.to_string(),
            to_ledger: ledger.to_string(),
            from_account: from.to_string(),
            to_account: to.to_string(),
            date,
            amount,
            received: None,
            fee: None,
            notes: String::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.from_ledger == self.to_ledger
    }
}

/// Resolves names and builds the `[from, to]` legs of a transfer.
pub fn prepare_transfer(conn: &Connection, req: &TransferRequest) -> Result<Vec<Transaction>> {
    let received = req.received.unwrap_or(req.amount);
    if req.amount <= Decimal::ZERO || received <= Decimal::ZERO {
        return Err(LedgerError::invalid("transfer amounts must be positive"));
    }
    if req.is_local() && received != req.amount {
        return Err(LedgerError::invalid(
            "a transfer within one ledger cannot change the amount",
        ));
    }

    let (from_id, _) = postable_node(conn, &req.from_ledger, ChartTable::Accounts, &req.from_account)?;
    let (to_id, _) = postable_node(conn, &req.to_ledger, ChartTable::Accounts, &req.to_account)?;
    if req.is_local() && from_id == to_id {
        return Err(LedgerError::invalid("cannot transfer an account into itself"));
    }

    let fee = match &req.fee {
        Some(fee) if !fee.amount.is_zero() => {
            if fee.amount < Decimal::ZERO {
                return Err(LedgerError::invalid("transfer fee must not be negative"));
            }
            let (category_id, kind) =
                postable_node(conn, &req.from_ledger, ChartTable::Categories, &fee.category)?;
            if kind != ChartKind::Expense {
                return Err(LedgerError::constraint(format!(
                    "fee category '{}' is not an expense category",
                    fee.category.trim()
                )));
            }
            Some((fee.amount, category_id))
        }
        _ => None,
    };

    let free_text = match req.notes.trim() {
        "" => String::new(),
        text => format!(" [ {} ]", text),
    };
    let route = if req.is_local() {
        format!("{} -> {}", req.from_account.trim(), req.to_account.trim())
    } else {
        format!(
            "{} ({}) -> {} ({})",
            req.from_account.trim(),
            req.from_ledger,
            req.to_account.trim(),
            req.to_ledger
        )
    };
    let to_notes = format!("{} {}{}", TRANSFER_TAG, route, free_text);

    let from_leg = match fee {
        None => Transaction::debit(req.date, &to_notes, req.amount, from_id),
        Some((fee_amount, category_id)) => {
            let from_notes = format!("{}{} {}{}", TRANSFER_TAG, SPLIT_TAG, route, free_text);
            let total = req
                .amount
                .checked_add(fee_amount)
                .ok_or_else(|| LedgerError::invalid("transfer amount plus fee overflows"))?;
            Transaction::debit(req.date, &from_notes, total, from_id).with_splits(vec![
                SplitTransaction::debit(req.date, &to_notes, req.amount, from_id),
                SplitTransaction::debit(req.date, FEE_NOTES, fee_amount, from_id).in_category(category_id),
            ])
        }
    };
    let to_leg = Transaction::credit(req.date, &to_notes, received, to_id);
    Ok(vec![from_leg, to_leg])
}

/// Posts both legs of a transfer in one store transaction. Returns the ids of
/// the `[from, to]` rows.
pub fn transfer_funds(
    conn: &mut Connection,
    from_ledger: &str,
    to_ledger: &str,
    legs: &[Transaction],
) -> Result<[i64; 2]> {
    let [from_leg, to_leg] = legs else {
        return Err(LedgerError::invalid(format!(
            "a transfer needs exactly two transactions, got {}",
            legs.len()
        )));
    };
    let from_t = LedgerTables::resolve(conn, from_ledger)?;
    let to_t = LedgerTables::resolve(conn, to_ledger)?;

    let tx = conn.transaction()?;
    let posted = insert_transaction(&tx, &from_t, from_leg)
        .and_then(|from_id| Ok([from_id, insert_transaction(&tx, &to_t, to_leg)?]));
    let ids = match posted {
        Ok(ids) => ids,
        Err(e) => {
            warn!(from_ledger, to_ledger, error = %e, "transfer rejected");
            return Err(e);
        }
    };
    tx.commit()?;
    info!(
        from_ledger,
        to_ledger,
        from_id = ids[0],
        to_id = ids[1],
        amount = %from_leg.debit,
        "funds transferred"
    );
    Ok(ids)
}
