// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Gbp,
    Inr,
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Inr, Currency::Usd];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GBP" => Ok(Currency::Gbp),
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            other => Err(LedgerError::invalid(format!(
                "currency '{}' not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub name: String,
    pub currency: Currency,
}

/// Which per-ledger table a chart node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTable {
    Accounts,
    Categories,
}

impl ChartTable {
    pub fn label(&self) -> &'static str {
        match self {
            ChartTable::Accounts => "account",
            ChartTable::Categories => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Asset,
    Liability,
    Income,
    Expense,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Asset => "asset",
            ChartKind::Liability => "liability",
            ChartKind::Income => "income",
            ChartKind::Expense => "expense",
        }
    }

    pub fn table(&self) -> ChartTable {
        match self {
            ChartKind::Asset | ChartKind::Liability => ChartTable::Accounts,
            ChartKind::Income | ChartKind::Expense => ChartTable::Categories,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asset" => Ok(ChartKind::Asset),
            "liability" => Ok(ChartKind::Liability),
            "income" => Ok(ChartKind::Income),
            "expense" => Ok(ChartKind::Expense),
            other => Err(LedgerError::invalid(format!("unknown chart kind '{}'", other))),
        }
    }
}

/// An account or a category. Categories carry zero balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartNode {
    pub id: i64,
    pub name: String,
    pub kind: ChartKind,
    pub placeholder: bool,
    pub parent_id: i64,
    pub opening_balance: Decimal,
    pub balance: Decimal,
    pub children: Vec<ChartNode>,
}

#[derive(Debug, Clone)]
pub struct NewChartNode {
    pub name: String,
    pub kind: ChartKind,
    pub placeholder: bool,
    pub parent: Option<String>,
    pub opening_balance: Decimal,
}

impl NewChartNode {
    pub fn leaf(name: &str, kind: ChartKind) -> Self {
        NewChartNode {
            name: name.to_string(),
            kind,
            placeholder: false,
            parent: None,
            opening_balance: Decimal::ZERO,
        }
    }

    pub fn placeholder(name: &str, kind: ChartKind) -> Self {
        NewChartNode {
            placeholder: true,
            ..NewChartNode::leaf(name, kind)
        }
    }

    pub fn under(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_opening_balance(mut self, amount: Decimal) -> Self {
        self.opening_balance = amount;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTransaction {
    pub id: i64,
    pub parent_transaction_id: i64,
    pub date: NaiveDate,
    pub notes: String,
    pub credit: Decimal,
    pub debit: Decimal,
    pub account_id: i64,
    pub category_id: Option<i64>,
}

impl SplitTransaction {
    pub fn debit(date: NaiveDate, notes: &str, amount: Decimal, account_id: i64) -> Self {
        SplitTransaction {
            id: 0,
            parent_transaction_id: 0,
            date,
            notes: notes.to_string(),
            credit: Decimal::ZERO,
            debit: amount,
            account_id,
            category_id: None,
        }
    }

    pub fn credit(date: NaiveDate, notes: &str, amount: Decimal, account_id: i64) -> Self {
        SplitTransaction {
            credit: amount,
            debit: Decimal::ZERO,
            ..SplitTransaction::debit(date, notes, Decimal::ZERO, account_id)
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub notes: String,
    pub credit: Decimal,
    pub debit: Decimal,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub is_split: bool,
    pub splits: Vec<SplitTransaction>,
}

impl Transaction {
    pub fn debit(date: NaiveDate, notes: &str, amount: Decimal, account_id: i64) -> Self {
        Transaction {
            id: 0,
            date,
            notes: notes.to_string(),
            credit: Decimal::ZERO,
            debit: amount,
            account_id,
            category_id: None,
            is_split: false,
            splits: Vec::new(),
        }
    }

    pub fn credit(date: NaiveDate, notes: &str, amount: Decimal, account_id: i64) -> Self {
        Transaction {
            credit: amount,
            debit: Decimal::ZERO,
            ..Transaction::debit(date, notes, Decimal::ZERO, account_id)
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_splits(mut self, splits: Vec<SplitTransaction>) -> Self {
        self.is_split = true;
        self.category_id = None;
        self.splits = splits;
        self
    }

    /// Signed effect on the owning account: `+credit` or `-debit`.
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// One line of a transaction listing. Rows taken from the split table carry `parent_id`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: NaiveDate,
    pub notes: String,
    pub credit: Decimal,
    pub debit: Decimal,
    pub account: Option<String>,
    pub category: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockKind {
    #[serde(rename = "mutual fund")]
    MutualFund,
    #[serde(rename = "gold")]
    Gold,
    #[serde(rename = "others")]
    Other,
}

impl StockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockKind::MutualFund => "mutual fund",
            StockKind::Gold => "gold",
            StockKind::Other => "others",
        }
    }
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mutual fund" | "mf" => Ok(StockKind::MutualFund),
            "gold" => Ok(StockKind::Gold),
            "others" | "other" => Ok(StockKind::Other),
            other => Err(LedgerError::invalid(format!("unknown stock type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Active,
    Holding,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Active => "active",
            StockStatus::Holding => "holding",
        }
    }

    pub fn toggled(&self) -> StockStatus {
        match self {
            StockStatus::Active => StockStatus::Holding,
            StockStatus::Holding => StockStatus::Active,
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(StockStatus::Active),
            "holding" => Ok(StockStatus::Holding),
            other => Err(LedgerError::invalid(format!(
                "invalid stock status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub name: String,
    pub kind: StockKind,
    pub code: String,
    pub plan: String,
    pub status: StockStatus,
    pub units: Decimal,
    pub nav: Decimal,
    pub nav_date: String,
    pub invested: Decimal,
}

/// Percentage gain of `value` over `invested`, or `None` when nothing is invested.
pub fn change_pct(value: Decimal, invested: Decimal) -> Result<Option<Decimal>, LedgerError> {
    if invested.is_zero() {
        return Ok(None);
    }
    value
        .checked_sub(invested)
        .and_then(|gain| gain.checked_div(invested))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| Some(pct.round_dp(2)))
        .ok_or_else(|| LedgerError::invalid("change percentage overflows the decimal range"))
}

impl Stock {
    /// Current value, `units * nav` rounded to 2 places.
    pub fn value(&self) -> Result<Decimal, LedgerError> {
        self.units
            .checked_mul(self.nav)
            .map(|v| v.round_dp(2))
            .ok_or_else(|| {
                LedgerError::invalid(format!("value of '{}' overflows the decimal range", self.name))
            })
    }

    pub fn change_pct(&self) -> Result<Option<Decimal>, LedgerError> {
        change_pct(self.value()?, self.invested)
    }
}

#[derive(Debug, Clone)]
pub struct NewStock {
    pub name: String,
    pub kind: StockKind,
    pub code: String,
    pub plan: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockOperation {
    Purchase,
    Redeem,
    SwitchTo(String),
    SwitchFrom(String),
}

impl StockOperation {
    /// True when the operation adds units and invested amount to the stock.
    pub fn is_inflow(&self) -> bool {
        matches!(self, StockOperation::Purchase | StockOperation::SwitchFrom(_))
    }

    pub fn moves_cash(&self) -> bool {
        matches!(self, StockOperation::Purchase | StockOperation::Redeem)
    }
}

impl fmt::Display for StockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockOperation::Purchase => f.write_str("purchase"),
            StockOperation::Redeem => f.write_str("redeem"),
            StockOperation::SwitchTo(name) => write!(f, "switch to {}", name),
            StockOperation::SwitchFrom(name) => write!(f, "switch from {}", name),
        }
    }
}

impl FromStr for StockOperation {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("switch from ") {
            Ok(StockOperation::SwitchFrom(name.to_string()))
        } else if let Some(name) = s.strip_prefix("switch to ") {
            Ok(StockOperation::SwitchTo(name.to_string()))
        } else if s.contains("purchase") {
            Ok(StockOperation::Purchase)
        } else if s.contains("redeem") {
            Ok(StockOperation::Redeem)
        } else {
            Err(LedgerError::invalid(format!("unknown stock operation '{}'", s)))
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockTransaction {
    pub operation: StockOperation,
    pub stock_id: i64,
    pub date: NaiveDate,
    pub units: Decimal,
    pub nav: Decimal,
    pub amount: Decimal,
    pub bank_account_id: Option<i64>,
}

/// A row of the per-stock operation log.
#[derive(Debug, Clone, Serialize)]
pub struct StockLogRow {
    pub id: i64,
    pub date: NaiveDate,
    pub operation: String,
    pub units: Decimal,
    pub nav: Decimal,
    pub amount: Decimal,
    pub bank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavQuote {
    pub code: String,
    pub nav: Decimal,
    pub nav_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Monthly,
    Yearly,
}

impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "monthly" | "month" | "m" => Ok(Period::Monthly),
            "yearly" | "year" | "y" => Ok(Period::Yearly),
            other => Err(LedgerError::invalid(format!("unknown period '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsPoint {
    pub period: String,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_operation_text_round_trips_through_log_notes() {
        let op = StockOperation::SwitchFrom("Index Fund".to_string());
        assert_eq!(op.to_string(), "switch from Index Fund");
        assert_eq!("switch from Index Fund".parse::<StockOperation>().unwrap(), op);
        assert!("switch to Gold ETF".parse::<StockOperation>().unwrap().to_string() == "switch to Gold ETF");
        assert!("bonus".parse::<StockOperation>().is_err());
    }

    #[test]
    fn inflow_operations_add_units() {
        assert!(StockOperation::Purchase.is_inflow());
        assert!(StockOperation::SwitchFrom("a".into()).is_inflow());
        assert!(!StockOperation::Redeem.is_inflow());
        assert!(!StockOperation::SwitchTo("a".into()).is_inflow());
        assert!(!StockOperation::SwitchTo("a".into()).moves_cash());
    }

    #[test]
    fn stock_change_uses_rounded_value() {
        let stock = Stock {
            id: 1,
            name: "Bluechip".into(),
            kind: StockKind::MutualFund,
            code: "120503".into(),
            plan: "direct".into(),
            status: StockStatus::Active,
            units: Decimal::from_str_exact("10.000").unwrap(),
            nav: Decimal::from_str_exact("110.5000").unwrap(),
            nav_date: "01-Oct-2026".into(),
            invested: Decimal::from_str_exact("1000.00").unwrap(),
        };
        assert_eq!(stock.value().unwrap(), Decimal::from_str_exact("1105.00").unwrap());
        assert_eq!(
            stock.change_pct().unwrap(),
            Some(Decimal::from_str_exact("10.50").unwrap())
        );

        let huge = Stock {
            units: Decimal::MAX,
            nav: Decimal::TWO,
            ..stock
        };
        assert!(matches!(huge.value(), Err(LedgerError::InvalidArgument(_))));
        assert!(huge.change_pct().is_err());
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(Currency::Inr.symbol(), "₹");
        assert!("EUR".parse::<Currency>().is_err());
    }
}
