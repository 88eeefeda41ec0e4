// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::db::LedgerTables;
use crate::error::{LedgerError, Result};
use crate::ledger::chart::resolve_filter_ids;
use crate::models::{ChartTable, SplitTransaction, Transaction, TransactionRow};
use crate::utils::{decimal_col, like_escape};

pub const TRANSFER_TAG: &str = "<trans>";
pub const SPLIT_TAG: &str = "<split>";
const SUGGESTION_LIMIT: usize = 15;

/// Checks the amount shape of a transaction before anything is written.
pub(crate) fn validate_transaction(t: &Transaction) -> Result<()> {
    check_amounts(t.credit, t.debit, "transaction")?;
    if !t.is_split {
        return Ok(());
    }
    if t.splits.is_empty() {
        return Err(LedgerError::invalid("split transaction has no splits"));
    }
    let mut total = Decimal::ZERO;
    for split in &t.splits {
        check_amounts(split.credit, split.debit, "split")?;
        if split.account_id != t.account_id {
            return Err(LedgerError::invalid(format!(
                "split posts to account id {} but its transaction to {}",
                split.account_id, t.account_id
            )));
        }
        total = total
            .checked_add(split.net())
            .ok_or_else(|| LedgerError::invalid("split amounts overflow the decimal range"))?;
    }
    if total != t.net() {
        return Err(LedgerError::invalid(format!(
            "splits sum to {} but the transaction amounts to {}",
            total,
            t.net()
        )));
    }
    Ok(())
}

fn check_amounts(credit: Decimal, debit: Decimal, what: &str) -> Result<()> {
    if credit < Decimal::ZERO || debit < Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "{} credit/debit must not be negative",
            what
        )));
    }
    if !credit.is_zero() && !debit.is_zero() {
        return Err(LedgerError::invalid(format!(
            "{} cannot be both a credit and a debit",
            what
        )));
    }
    Ok(())
}

/// Fails unless the account exists and accepts postings.
pub(crate) fn ensure_postable_account(
    conn: &Connection,
    t: &LedgerTables,
    account_id: i64,
) -> Result<()> {
    let placeholder: Option<bool> = conn
        .query_row(
            &format!("SELECT placeholder FROM {} WHERE id=?1", t.accounts),
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    match placeholder {
        None => Err(LedgerError::constraint(format!(
            "account id {} does not exist in ledger '{}'",
            account_id, t.ledger
        ))),
        Some(true) => Err(LedgerError::constraint(format!(
            "account id {} is a placeholder",
            account_id
        ))),
        Some(false) => Ok(()),
    }
}

fn ensure_postable_category(conn: &Connection, t: &LedgerTables, category_id: i64) -> Result<()> {
    let placeholder: Option<bool> = conn
        .query_row(
            &format!("SELECT placeholder FROM {} WHERE id=?1", t.categories),
            params![category_id],
            |r| r.get(0),
        )
        .optional()?;
    match placeholder {
        None => Err(LedgerError::constraint(format!(
            "category id {} does not exist in ledger '{}'",
            category_id, t.ledger
        ))),
        Some(true) => Err(LedgerError::constraint(format!(
            "category id {} is a placeholder",
            category_id
        ))),
        Some(false) => Ok(()),
    }
}

/// Adds `delta` to the stored balance of an account. A zero delta is a no-op.
pub(crate) fn update_account_balance(
    conn: &Connection,
    t: &LedgerTables,
    account_id: i64,
    delta: Decimal,
) -> Result<()> {
    if delta.is_zero() {
        return Ok(());
    }
    let current = conn
        .query_row(
            &format!("SELECT balance FROM {} WHERE id=?1", t.accounts),
            params![account_id],
            |r| decimal_col(r, 0),
        )
        .optional()?
        .ok_or_else(|| {
            LedgerError::constraint(format!("account id {} does not exist", account_id))
        })?;
    let next = current.checked_add(delta).ok_or_else(|| {
        LedgerError::invalid(format!("balance of account id {} would overflow", account_id))
    })?;
    conn.execute(
        &format!("UPDATE {} SET balance=?1 WHERE id=?2", t.accounts),
        params![next.to_string(), account_id],
    )?;
    Ok(())
}

/// Inserts a transaction, its splits and the balance effect on the caller's
/// store transaction. Nothing is committed here.
pub(crate) fn insert_transaction(
    conn: &Connection,
    t: &LedgerTables,
    txn: &Transaction,
) -> Result<i64> {
    validate_transaction(txn)?;
    ensure_postable_account(conn, t, txn.account_id)?;
    let category_id = if txn.is_split { None } else { txn.category_id };
    if let Some(cid) = category_id {
        ensure_postable_category(conn, t, cid)?;
    }

    conn.execute(
        &format!(
            "INSERT INTO {}(date, notes, credit, debit, account_id, category_id, is_split)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            t.transactions
        ),
        params![
            txn.date,
            txn.notes,
            txn.credit.to_string(),
            txn.debit.to_string(),
            txn.account_id,
            category_id,
            txn.is_split
        ],
    )?;
    let id = conn.last_insert_rowid();

    if txn.is_split {
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO {}(date, notes, credit, debit, account_id, category_id, parent_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            t.splits
        ))?;
        for split in &txn.splits {
            if let Some(cid) = split.category_id {
                ensure_postable_category(conn, t, cid)?;
            }
            stmt.execute(params![
                split.date,
                split.notes,
                split.credit.to_string(),
                split.debit.to_string(),
                split.account_id,
                split.category_id,
                id
            ])?;
        }
    }

    update_account_balance(conn, t, txn.account_id, txn.net())?;
    Ok(id)
}

/// Records a transaction (and its splits) and applies it to the account balance atomically.
pub fn add_transaction(conn: &mut Connection, ledger: &str, txn: &Transaction) -> Result<i64> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let tx = conn.transaction()?;
    let id = match insert_transaction(&tx, &t, txn) {
        Ok(id) => id,
        Err(e) => {
            warn!(ledger, error = %e, "transaction rejected");
            return Err(e);
        }
    };
    tx.commit()?;
    info!(ledger, id, account_id = txn.account_id, net = %txn.net(), "transaction added");
    Ok(id)
}

fn load_transaction(conn: &Connection, t: &LedgerTables, id: i64) -> Result<Transaction> {
    let found = conn
        .query_row(
            &format!(
                "SELECT id, date, notes, credit, debit, account_id, category_id, is_split
                 FROM {} WHERE id=?1",
                t.transactions
            ),
            params![id],
            |r| {
                Ok(Transaction {
                    id: r.get(0)?,
                    date: r.get(1)?,
                    notes: r.get(2)?,
                    credit: decimal_col(r, 3)?,
                    debit: decimal_col(r, 4)?,
                    account_id: r.get(5)?,
                    category_id: r.get(6)?,
                    is_split: r.get(7)?,
                    splits: Vec::new(),
                })
            },
        )
        .optional()?;
    let mut txn = found.ok_or_else(|| {
        LedgerError::not_found(format!("transaction {} in ledger '{}'", id, t.ledger))
    })?;

    let mut stmt = conn.prepare_cached(&format!(
        "SELECT id, parent_transaction_id, date, notes, credit, debit, account_id, category_id
         FROM {} WHERE parent_transaction_id=?1 ORDER BY id",
        t.splits
    ))?;
    let splits = stmt.query_map(params![id], |r| {
        Ok(SplitTransaction {
            id: r.get(0)?,
            parent_transaction_id: r.get(1)?,
            date: r.get(2)?,
            notes: r.get(3)?,
            credit: decimal_col(r, 4)?,
            debit: decimal_col(r, 5)?,
            account_id: r.get(6)?,
            category_id: r.get(7)?,
        })
    })?;
    for split in splits {
        txn.splits.push(split?);
    }
    Ok(txn)
}

pub fn get_transaction(conn: &Connection, ledger: &str, id: i64) -> Result<Transaction> {
    let t = LedgerTables::resolve(conn, ledger)?;
    load_transaction(conn, &t, id)
}

/// Deletes a transaction with its splits and reverses its balance effect.
pub fn delete_transaction(conn: &mut Connection, ledger: &str, id: i64) -> Result<Transaction> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let tx = conn.transaction()?;
    let txn = load_transaction(&tx, &t, id)?;
    tx.execute(
        &format!("DELETE FROM {} WHERE parent_transaction_id=?1", t.splits),
        params![id],
    )?;
    tx.execute(
        &format!("DELETE FROM {} WHERE id=?1", t.transactions),
        params![id],
    )?;
    update_account_balance(&tx, &t, txn.account_id, -txn.net())?;
    tx.commit()?;
    info!(ledger, id, account_id = txn.account_id, "transaction deleted");
    Ok(txn)
}

enum RowFilter {
    All,
    Accounts(Vec<i64>),
    Categories(Vec<i64>),
    Keywords(Vec<String>, bool),
}

/// Union of plain transactions and split rows; split parents are left out so
/// every amount shows up once under its own category.
fn query_rows(
    conn: &Connection,
    t: &LedgerTables,
    filter: RowFilter,
    limit: usize,
) -> Result<Vec<TransactionRow>> {
    let mut sql = format!(
        "SELECT u.id, u.date, u.notes, u.credit, u.debit, a.name, c.name, u.parent_id
         FROM (
             SELECT id, date, notes, credit, debit, account_id, category_id, NULL AS parent_id
             FROM {txn} WHERE is_split = 0
             UNION ALL
             SELECT id, date, notes, credit, debit, account_id, category_id, parent_transaction_id
             FROM {spl}
         ) AS u
         LEFT JOIN {acc} a ON u.account_id = a.id
         LEFT JOIN {cat} c ON u.category_id = c.id
         WHERE 1=1",
        txn = t.transactions,
        spl = t.splits,
        acc = t.accounts,
        cat = t.categories,
    );
    let mut values: Vec<Value> = Vec::new();

    match filter {
        RowFilter::All => {}
        RowFilter::Accounts(ids) | RowFilter::Categories(ids) if ids.is_empty() => {
            return Ok(Vec::new());
        }
        RowFilter::Accounts(ids) => {
            sql.push_str(&format!(" AND u.account_id IN ({})", placeholders(ids.len())));
            values.extend(ids.into_iter().map(Value::Integer));
        }
        RowFilter::Categories(ids) => {
            sql.push_str(&format!(" AND u.category_id IN ({})", placeholders(ids.len())));
            values.extend(ids.into_iter().map(Value::Integer));
        }
        RowFilter::Keywords(tokens, include_tagged) => {
            for token in tokens {
                sql.push_str(" AND u.notes LIKE ? ESCAPE '\\'");
                values.push(Value::Text(format!("%{}%", like_escape(&token))));
            }
            if !include_tagged {
                sql.push_str(&format!(
                    " AND u.notes NOT LIKE '{}%' AND u.notes NOT LIKE '{}%'",
                    TRANSFER_TAG, SPLIT_TAG
                ));
            }
        }
    }
    sql.push_str(" ORDER BY u.date DESC, u.id DESC LIMIT ?");
    values.push(Value::Integer(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |r| {
        Ok(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            notes: r.get(2)?,
            credit: decimal_col(r, 3)?,
            debit: decimal_col(r, 4)?,
            account: r.get(5)?,
            category: r.get(6)?,
            parent_id: r.get(7)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Transactions posted to an account, or to every leaf under a placeholder.
/// An empty name or `.` lists the whole ledger.
pub fn transactions_for_account(
    conn: &Connection,
    ledger: &str,
    account: &str,
    limit: usize,
) -> Result<Vec<TransactionRow>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let filter = match resolve_filter_ids(conn, ledger, ChartTable::Accounts, account)? {
        None => RowFilter::All,
        Some((_, ids)) => RowFilter::Accounts(ids),
    };
    query_rows(conn, &t, filter, limit)
}

pub fn transactions_for_category(
    conn: &Connection,
    ledger: &str,
    category: &str,
    limit: usize,
) -> Result<Vec<TransactionRow>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let filter = match resolve_filter_ids(conn, ledger, ChartTable::Categories, category)? {
        None => RowFilter::All,
        Some((_, ids)) => RowFilter::Categories(ids),
    };
    query_rows(conn, &t, filter, limit)
}

/// Rows whose notes contain every space-separated token. Transfer and split
/// tagged notes are skipped unless a token itself names a tag.
pub fn transactions_for_keywords(
    conn: &Connection,
    ledger: &str,
    keywords: &str,
    limit: usize,
) -> Result<Vec<TransactionRow>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let tokens: Vec<String> = keywords.split_whitespace().map(str::to_string).collect();
    let include_tagged = tokens
        .iter()
        .any(|tok| tok.contains(TRANSFER_TAG) || tok.contains(SPLIT_TAG));
    query_rows(conn, &t, RowFilter::Keywords(tokens, include_tagged), limit)
}

pub fn splits_for_transaction(
    conn: &Connection,
    ledger: &str,
    id: i64,
) -> Result<Vec<TransactionRow>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT s.id, s.date, s.notes, s.credit, s.debit, a.name, c.name, s.parent_transaction_id
         FROM {spl} s
         LEFT JOIN {acc} a ON s.account_id = a.id
         LEFT JOIN {cat} c ON s.category_id = c.id
         WHERE s.parent_transaction_id = ?1
         ORDER BY s.id",
        spl = t.splits,
        acc = t.accounts,
        cat = t.categories,
    ))?;
    let rows = stmt.query_map(params![id], |r| {
        Ok(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            notes: r.get(2)?,
            credit: decimal_col(r, 3)?,
            debit: decimal_col(r, 4)?,
            account: r.get(5)?,
            category: r.get(6)?,
            parent_id: r.get(7)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Distinct previous notes matching every token, newest first, for note completion.
///
/// With `transfers_only` the bracketed free text of transfer notes is returned instead.
pub fn note_suggestions(
    conn: &Connection,
    ledger: &str,
    keywords: &str,
    transfers_only: bool,
) -> Result<Vec<String>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let mut sql = format!(
        "SELECT notes, MAX(date) AS latest FROM {} WHERE 1=1",
        t.transactions
    );
    let mut values: Vec<Value> = Vec::new();
    for token in keywords.split_whitespace() {
        sql.push_str(" AND notes LIKE ? ESCAPE '\\'");
        values.push(Value::Text(format!("%{}%", like_escape(token))));
    }
    if transfers_only {
        sql.push_str(&format!(" AND notes LIKE '{}%[%]'", TRANSFER_TAG));
    } else {
        sql.push_str(&format!(
            " AND notes NOT LIKE '{}%' AND notes NOT LIKE '{}%'",
            TRANSFER_TAG, SPLIT_TAG
        ));
    }
    sql.push_str(" GROUP BY notes ORDER BY latest DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |r| r.get::<_, String>(0))?;
    let mut notes: Vec<String> = Vec::new();
    for row in rows {
        let note = row?;
        let text = if transfers_only {
            match (note.find('['), note.rfind(']')) {
                (Some(open), Some(close)) if open < close => note[open + 1..close].trim().to_string(),
                _ => continue,
            }
        } else {
            note
        };
        if !text.is_empty() && !notes.contains(&text) {
            notes.push(text);
        }
        if notes.len() == SUGGESTION_LIMIT {
            break;
        }
    }
    Ok(notes)
}
