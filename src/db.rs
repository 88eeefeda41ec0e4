// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::models::{Currency, Ledger};
use crate::utils::is_valid_ledger_name;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pocketledger", "pocketledger"));

pub const DB_ENV: &str = "POCKETLEDGER_DB";
const BACKUP_MARKER: &str = "_backup_";

/// Resolves the store file: explicit override, then `POCKETLEDGER_DB`, then the platform data dir.
pub fn db_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = override_path {
        return Ok(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .ok_or_else(|| LedgerError::not_found("platform-specific data dir"))?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir)?;
    Ok(data_dir.join("pocketledger.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    init_schema(&mut conn)?;
    debug!(path = %path.display(), "store opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ledgers(
        name TEXT PRIMARY KEY,
        currency TEXT NOT NULL CHECK(currency IN ('GBP','INR','USD'))
    );
    "#,
    )?;
    Ok(())
}

/// Validated, prefixed table names of one ledger.
#[derive(Debug, Clone)]
pub struct LedgerTables {
    pub ledger: String,
    pub accounts: String,
    pub categories: String,
    pub transactions: String,
    pub splits: String,
    pub stocks: String,
    pub stock_transactions: String,
}

impl LedgerTables {
    fn for_name(name: &str) -> Result<Self> {
        if !is_valid_ledger_name(name) {
            return Err(LedgerError::invalid(format!(
                "ledger name '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                name
            )));
        }
        Ok(LedgerTables {
            ledger: name.to_string(),
            accounts: format!("{}_accounts", name),
            categories: format!("{}_categories", name),
            transactions: format!("{}_transactions", name),
            splits: format!("{}_split_transactions", name),
            stocks: format!("{}_stocks", name),
            stock_transactions: format!("{}_stocks_transactions", name),
        })
    }

    /// Validates the name and checks that the ledger has been created.
    pub fn resolve(conn: &Connection, name: &str) -> Result<Self> {
        let tables = Self::for_name(name)?;
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM ledgers WHERE name=?1", params![name], |r| {
                r.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(LedgerError::not_found(format!("ledger '{}'", name)));
        }
        Ok(tables)
    }
}

/// Registers a ledger and creates its tables in one store transaction.
pub fn create_ledger(conn: &mut Connection, name: &str, currency: Currency) -> Result<Ledger> {
    let t = LedgerTables::for_name(name)?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO ledgers(name, currency) VALUES (?1, ?2)",
        params![name, currency.code()],
    )?;
    tx.execute_batch(&format!(
        r#"
    CREATE TABLE {acc}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('asset','liability')),
        opening_balance TEXT NOT NULL DEFAULT '0',
        balance TEXT NOT NULL DEFAULT '0',
        placeholder INTEGER NOT NULL CHECK(placeholder IN (0,1)),
        parent_id INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE {cat}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        placeholder INTEGER NOT NULL CHECK(placeholder IN (0,1)),
        parent_id INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE {txn}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        notes TEXT NOT NULL,
        credit TEXT NOT NULL DEFAULT '0',
        debit TEXT NOT NULL DEFAULT '0',
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        is_split INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(account_id) REFERENCES {acc}(id),
        FOREIGN KEY(category_id) REFERENCES {cat}(id)
    );
    CREATE INDEX {txn}_date ON {txn}(date);

    CREATE TABLE {spl}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        notes TEXT NOT NULL,
        credit TEXT NOT NULL DEFAULT '0',
        debit TEXT NOT NULL DEFAULT '0',
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        parent_transaction_id INTEGER NOT NULL,
        FOREIGN KEY(parent_transaction_id) REFERENCES {txn}(id),
        FOREIGN KEY(account_id) REFERENCES {acc}(id),
        FOREIGN KEY(category_id) REFERENCES {cat}(id)
    );
    CREATE INDEX {spl}_parent ON {spl}(parent_transaction_id);

    CREATE TABLE {stk}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('mutual fund','gold','others')),
        code TEXT NOT NULL DEFAULT '',
        plan TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','holding')),
        units TEXT NOT NULL DEFAULT '0',
        nav TEXT NOT NULL DEFAULT '0',
        navDate TEXT NOT NULL DEFAULT '',
        invested TEXT NOT NULL DEFAULT '0'
    );

    CREATE TABLE {stx}(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        notes TEXT NOT NULL,
        units TEXT NOT NULL,
        nav TEXT NOT NULL,
        amount TEXT NOT NULL,
        stock_id INTEGER NOT NULL,
        account_id INTEGER,
        FOREIGN KEY(stock_id) REFERENCES {stk}(id),
        FOREIGN KEY(account_id) REFERENCES {acc}(id)
    );
    "#,
        acc = t.accounts,
        cat = t.categories,
        txn = t.transactions,
        spl = t.splits,
        stk = t.stocks,
        stx = t.stock_transactions,
    ))?;
    tx.commit()?;
    info!(ledger = name, currency = currency.code(), "ledger created");
    Ok(Ledger {
        name: name.to_string(),
        currency,
    })
}

pub fn fetch_ledgers(conn: &Connection) -> Result<Vec<Ledger>> {
    let mut stmt = conn.prepare("SELECT name, currency FROM ledgers ORDER BY name")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut ledgers = Vec::new();
    for row in rows {
        let (name, ccy) = row?;
        ledgers.push(Ledger {
            name,
            currency: ccy.parse()?,
        });
    }
    Ok(ledgers)
}

pub fn get_ledger(conn: &Connection, name: &str) -> Result<Ledger> {
    let ccy: Option<String> = conn
        .query_row(
            "SELECT currency FROM ledgers WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    match ccy {
        Some(c) => Ok(Ledger {
            name: name.to_string(),
            currency: c.parse()?,
        }),
        None => Err(LedgerError::not_found(format!("ledger '{}'", name))),
    }
}

pub fn currency_for_ledger(conn: &Connection, name: &str) -> Result<Currency> {
    Ok(get_ledger(conn, name)?.currency)
}

pub fn get_default_ledger(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_ledger'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_default_ledger(conn: &Connection, name: &str) -> Result<()> {
    LedgerTables::resolve(conn, name)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_ledger', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![name],
    )?;
    Ok(())
}

/// Copies the store file next to itself with a timestamped backup suffix.
pub fn backup_db_file(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LedgerError::invalid(format!("invalid store path {}", path.display())))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("sqlite");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dest = path.with_file_name(format!("{}{}{}.{}", stem, BACKUP_MARKER, stamp, ext));
    fs::copy(path, &dest)?;
    info!(backup = %dest.display(), "store backed up");
    Ok(dest)
}

/// Deletes backup files in `dir` whose modification time is older than `max_age`.
pub fn cleanup_backups(dir: &Path, max_age: Duration) -> Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let is_backup = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.contains(BACKUP_MARKER));
        if meta.is_file() && is_backup && meta.modified()? < cutoff {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
