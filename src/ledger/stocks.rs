// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::LedgerTables;
use crate::error::{LedgerError, Result};
use crate::ledger::transactions::{TRANSFER_TAG, insert_transaction};
use crate::models::{
    change_pct, NavQuote, NewStock, Stock, StockKind, StockLogRow, StockOperation, StockStatus,
    StockTransaction, Transaction,
};
use crate::utils::decimal_col;

pub fn add_stock(conn: &Connection, ledger: &str, stock: &NewStock) -> Result<i64> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let name = stock.name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("stock name is required"));
    }
    conn.execute(
        &format!(
            "INSERT INTO {}(name, type, code, plan) VALUES (?1, ?2, ?3, ?4)",
            t.stocks
        ),
        params![name, stock.kind.as_str(), stock.code.trim(), stock.plan.trim()],
    )?;
    let id = conn.last_insert_rowid();
    info!(ledger, id, name, kind = stock.kind.as_str(), "stock added");
    Ok(id)
}

fn stock_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Stock, String, String)> {
    let kind_s: String = r.get(2)?;
    let status_s: String = r.get(5)?;
    Ok((
        Stock {
            id: r.get(0)?,
            name: r.get(1)?,
            kind: StockKind::Other,
            code: r.get(3)?,
            plan: r.get(4)?,
            status: StockStatus::Active,
            units: decimal_col(r, 6)?,
            nav: decimal_col(r, 7)?,
            nav_date: r.get(8)?,
            invested: decimal_col(r, 9)?,
        },
        kind_s,
        status_s,
    ))
}

fn finish_stock((mut stock, kind_s, status_s): (Stock, String, String)) -> Result<Stock> {
    stock.kind = kind_s.parse()?;
    stock.status = status_s.parse()?;
    Ok(stock)
}

const STOCK_COLUMNS: &str = "id, name, type, code, plan, status, units, nav, navDate, invested";

/// Stocks of a ledger ordered by type, status and name; `None` returns every status.
pub fn fetch_stocks(
    conn: &Connection,
    ledger: &str,
    status: Option<StockStatus>,
) -> Result<Vec<Stock>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE (?1 IS NULL OR status = ?1) ORDER BY type, status, name",
        STOCK_COLUMNS, t.stocks
    ))?;
    let rows = stmt.query_map(params![status.map(|s| s.as_str())], stock_from_row)?;
    let mut stocks = Vec::new();
    for row in rows {
        stocks.push(finish_stock(row?)?);
    }
    Ok(stocks)
}

fn load_stock(conn: &Connection, t: &LedgerTables, id: i64) -> Result<Stock> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM {} WHERE id=?1", STOCK_COLUMNS, t.stocks),
            params![id],
            stock_from_row,
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found(format!("stock {} in ledger '{}'", id, t.ledger)))?;
    finish_stock(row)
}

pub fn get_stock(conn: &Connection, ledger: &str, id: i64) -> Result<Stock> {
    let t = LedgerTables::resolve(conn, ledger)?;
    load_stock(conn, &t, id)
}

pub fn find_stock(conn: &Connection, ledger: &str, name: &str) -> Result<Stock> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let id: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE name=?1", t.stocks),
            params![name.trim()],
            |r| r.get(0),
        )
        .optional()?;
    match id {
        Some(id) => load_stock(conn, &t, id),
        None => Err(LedgerError::not_found(format!("stock '{}'", name.trim()))),
    }
}

/// Flips a stock between `active` and `holding` and returns the new status.
pub fn toggle_status(conn: &Connection, ledger: &str, stock_id: i64) -> Result<StockStatus> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let current: String = conn
        .query_row(
            &format!("SELECT status FROM {} WHERE id=?1", t.stocks),
            params![stock_id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found(format!("stock {}", stock_id)))?;
    let next = current.parse::<StockStatus>()?.toggled();
    conn.execute(
        &format!("UPDATE {} SET status=?1 WHERE id=?2", t.stocks),
        params![next.as_str(), stock_id],
    )?;
    info!(ledger, stock_id, status = next.as_str(), "stock status toggled");
    Ok(next)
}

fn validate_operation(op: &StockTransaction) -> Result<()> {
    if op.amount.is_zero() || op.units.is_zero() {
        return Err(LedgerError::invalid("stock amount and units must be non-zero"));
    }
    if op.amount < Decimal::ZERO || op.units < Decimal::ZERO || op.nav < Decimal::ZERO {
        return Err(LedgerError::invalid(
            "stock amount, units and nav must not be negative",
        ));
    }
    Ok(())
}

/// Writes the log row and moves the stock totals on the caller's store transaction.
fn apply_operation(conn: &Connection, t: &LedgerTables, op: &StockTransaction) -> Result<(i64, Stock)> {
    validate_operation(op)?;
    let stock = load_stock(conn, t, op.stock_id)?;
    let bank = op.bank_account_id.filter(|id| *id != 0);

    conn.execute(
        &format!(
            "INSERT INTO {}(date, notes, units, nav, amount, stock_id, account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            t.stock_transactions
        ),
        params![
            op.date,
            op.operation.to_string(),
            op.units.to_string(),
            op.nav.to_string(),
            op.amount.to_string(),
            op.stock_id,
            bank
        ],
    )?;
    let log_id = conn.last_insert_rowid();

    let moved = if op.operation.is_inflow() {
        stock
            .units
            .checked_add(op.units)
            .zip(stock.invested.checked_add(op.amount))
    } else {
        stock
            .units
            .checked_sub(op.units)
            .zip(stock.invested.checked_sub(op.amount))
    };
    let (units, invested) = moved.ok_or_else(|| {
        LedgerError::invalid(format!("totals of '{}' would overflow", stock.name))
    })?;
    if units < Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "cannot remove {} units from '{}' holding {}",
            op.units, stock.name, stock.units
        )));
    }
    conn.execute(
        &format!(
            "UPDATE {} SET units=?1, nav=?2, invested=?3 WHERE id=?4",
            t.stocks
        ),
        params![
            units.to_string(),
            op.nav.to_string(),
            invested.to_string(),
            op.stock_id
        ],
    )?;
    Ok((log_id, stock))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockActionOutcome {
    pub log_id: i64,
    pub cash_transaction_id: Option<i64>,
}

/// Records a purchase, redeem or single switch leg against a stock.
///
/// A plain purchase or redeem with a bank account also posts the cash leg
/// (debit on purchase, credit on redeem). The log row, the stock totals and
/// the cash leg commit together or not at all.
pub fn action_stock_units(
    conn: &mut Connection,
    ledger: &str,
    op: &StockTransaction,
) -> Result<StockActionOutcome> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let tx = conn.transaction()?;
    let (log_id, stock) = match apply_operation(&tx, &t, op) {
        Ok(v) => v,
        Err(e) => {
            warn!(ledger, stock_id = op.stock_id, error = %e, "stock operation rejected");
            return Err(e);
        }
    };

    let mut cash_transaction_id = None;
    if let Some(bank) = op.bank_account_id.filter(|id| *id != 0) {
        if op.operation.moves_cash() {
            let notes = format!("{} stock {} - {}", TRANSFER_TAG, op.operation, stock.name);
            let cash = match op.operation {
                StockOperation::Purchase => Transaction::debit(op.date, &notes, op.amount, bank),
                _ => Transaction::credit(op.date, &notes, op.amount, bank),
            };
            cash_transaction_id = Some(insert_transaction(&tx, &t, &cash)?);
        }
    }
    tx.commit()?;
    info!(
        ledger,
        stock_id = op.stock_id,
        operation = %op.operation,
        units = %op.units,
        amount = %op.amount,
        "stock operation recorded"
    );
    Ok(StockActionOutcome {
        log_id,
        cash_transaction_id,
    })
}

/// Moving an amount from one stock into another.
#[derive(Debug, Clone)]
pub struct StockSwitch {
    pub from_stock_id: i64,
    pub to_stock_id: i64,
    pub date: NaiveDate,
    pub from_units: Decimal,
    pub to_units: Decimal,
    pub amount: Decimal,
}

/// NAV implied by a switch leg, truncated to 4 places.
pub fn implied_nav(amount: Decimal, units: Decimal) -> Decimal {
    if units.is_zero() {
        return Decimal::ZERO;
    }
    (amount / units).round_dp_with_strategy(4, RoundingStrategy::ToZero)
}

/// Commits both legs of a switch in one store transaction. Returns the two log ids.
pub fn switch_stock_units(conn: &mut Connection, ledger: &str, sw: &StockSwitch) -> Result<[i64; 2]> {
    if sw.from_stock_id == sw.to_stock_id {
        return Err(LedgerError::invalid("cannot switch a stock into itself"));
    }
    let t = LedgerTables::resolve(conn, ledger)?;
    let tx = conn.transaction()?;
    let from = load_stock(&tx, &t, sw.from_stock_id)?;
    let to = load_stock(&tx, &t, sw.to_stock_id)?;

    let out_leg = StockTransaction {
        operation: StockOperation::SwitchTo(to.name.clone()),
        stock_id: from.id,
        date: sw.date,
        units: sw.from_units,
        nav: implied_nav(sw.amount, sw.from_units),
        amount: sw.amount,
        bank_account_id: None,
    };
    let in_leg = StockTransaction {
        operation: StockOperation::SwitchFrom(from.name.clone()),
        stock_id: to.id,
        date: sw.date,
        units: sw.to_units,
        nav: implied_nav(sw.amount, sw.to_units),
        amount: sw.amount,
        bank_account_id: None,
    };
    let (out_id, _) = apply_operation(&tx, &t, &out_leg)?;
    let (in_id, _) = apply_operation(&tx, &t, &in_leg)?;
    tx.commit()?;
    info!(ledger, from = %from.name, to = %to.name, amount = %sw.amount, "stock switch recorded");
    Ok([out_id, in_id])
}

/// Operation log of a stock, newest first.
pub fn transactions_for_stock(
    conn: &Connection,
    ledger: &str,
    stock_id: i64,
) -> Result<Vec<StockLogRow>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT s.id, s.date, s.notes, s.units, s.nav, s.amount, a.name
         FROM {stx} s LEFT JOIN {acc} a ON s.account_id = a.id
         WHERE s.stock_id = ?1
         ORDER BY s.date DESC, s.id DESC",
        stx = t.stock_transactions,
        acc = t.accounts,
    ))?;
    let rows = stmt.query_map(params![stock_id], |r| {
        Ok(StockLogRow {
            id: r.get(0)?,
            date: r.get(1)?,
            operation: r.get(2)?,
            units: decimal_col(r, 3)?,
            nav: decimal_col(r, 4)?,
            amount: decimal_col(r, 5)?,
            bank: r.get(6)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Applies feed NAVs to mutual funds by scheme code. No log rows are written.
pub fn update_navs(conn: &mut Connection, ledger: &str, quotes: &[NavQuote]) -> Result<usize> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let tx = conn.transaction()?;
    let mut updated = 0;
    {
        let mut stmt = tx.prepare_cached(&format!(
            "UPDATE {} SET nav=?1, navDate=?2 WHERE code=?3 AND type='mutual fund'",
            t.stocks
        ))?;
        for q in quotes {
            updated += stmt.execute(params![q.nav.to_string(), q.nav_date, q.code])?;
        }
    }
    tx.commit()?;
    info!(ledger, quotes = quotes.len(), updated, "mutual fund NAVs refreshed");
    Ok(updated)
}

pub fn update_gold_price(
    conn: &Connection,
    ledger: &str,
    price: Decimal,
    price_date: &str,
) -> Result<usize> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let updated = conn.execute(
        &format!(
            "UPDATE {} SET nav=?1, navDate=?2 WHERE type='gold'",
            t.stocks
        ),
        params![price.round_dp(4).to_string(), price_date],
    )?;
    info!(ledger, updated, price = %price, "gold price refreshed");
    Ok(updated)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Holding {
    pub invested: Decimal,
    pub value: Decimal,
}

impl Holding {
    pub fn change_pct(&self) -> Result<Option<Decimal>> {
        change_pct(self.value, self.invested)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InvestmentSummary {
    pub mutual_fund: Holding,
    pub gold: Holding,
    pub others: Holding,
}

pub fn investment_summary(stocks: &[Stock]) -> Result<InvestmentSummary> {
    let mut summary = InvestmentSummary::default();
    for stock in stocks {
        let slot = match stock.kind {
            StockKind::MutualFund => &mut summary.mutual_fund,
            StockKind::Gold => &mut summary.gold,
            StockKind::Other => &mut summary.others,
        };
        let value = stock.value()?;
        let (Some(invested), Some(total)) = (
            slot.invested.checked_add(stock.invested),
            slot.value.checked_add(value),
        ) else {
            return Err(LedgerError::invalid(format!(
                "{} holdings overflow the decimal range",
                stock.kind
            )));
        };
        slot.invested = invested;
        slot.value = total;
    }
    Ok(summary)
}
