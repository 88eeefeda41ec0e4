// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account and category trees.
//!
//! Rows are loaded flat and linked in two passes: every node is indexed by id
//! first, then attached to its parent. A node whose parent is not part of the
//! loaded set is returned as a root rather than dropped.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::info;

use crate::db::LedgerTables;
use crate::error::{LedgerError, Result};
use crate::models::{ChartKind, ChartNode, ChartTable, NewChartNode};
use crate::utils::decimal_col;

/// Loads the accounts or categories of `ledger` as an ordered forest.
///
/// `kind` restricts the load to one kind; `placeholder_only` keeps only
/// placeholder nodes. Leaf account balances are `opening_balance + balance`.
pub fn build_chart(
    conn: &Connection,
    ledger: &str,
    table: ChartTable,
    kind: Option<ChartKind>,
    placeholder_only: bool,
) -> Result<Vec<ChartNode>> {
    let t = LedgerTables::resolve(conn, ledger)?;
    if let Some(k) = kind {
        if k.table() != table {
            return Err(LedgerError::invalid(format!(
                "{} is not a {} kind",
                k,
                table.label()
            )));
        }
    }

    let sql = match table {
        ChartTable::Accounts => format!(
            "SELECT id, name, type, placeholder, parent_id, opening_balance, balance
             FROM {} WHERE (?1 IS NULL OR type = ?1) AND (?2 = 0 OR placeholder = 1)
             ORDER BY type, id",
            t.accounts
        ),
        ChartTable::Categories => format!(
            "SELECT id, name, type, placeholder, parent_id, '0', '0'
             FROM {} WHERE (?1 IS NULL OR type = ?1) AND (?2 = 0 OR placeholder = 1)
             ORDER BY type, id",
            t.categories
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![kind.map(|k| k.as_str()), placeholder_only],
        |r| {
            let opening = decimal_col(r, 5)?;
            let delta = decimal_col(r, 6)?;
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, bool>(3)?,
                r.get::<_, i64>(4)?,
                opening,
                delta,
            ))
        },
    )?;

    let mut order = Vec::new();
    let mut nodes: HashMap<i64, ChartNode> = HashMap::new();
    for row in rows {
        let (id, name, kind_s, placeholder, parent_id, opening_balance, delta) = row?;
        let balance = opening_balance.checked_add(delta).ok_or_else(|| {
            LedgerError::invalid(format!("balance of '{}' overflows the decimal range", name))
        })?;
        order.push(id);
        nodes.insert(
            id,
            ChartNode {
                id,
                name,
                kind: kind_s.parse()?,
                placeholder,
                parent_id,
                opening_balance,
                balance,
                children: Vec::new(),
            },
        );
    }

    let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut root_ids = Vec::new();
    for id in &order {
        let parent_id = nodes[id].parent_id;
        if parent_id != 0 && nodes.contains_key(&parent_id) {
            children_of.entry(parent_id).or_default().push(*id);
        } else {
            root_ids.push(*id);
        }
    }

    fn assemble(
        id: i64,
        nodes: &mut HashMap<i64, ChartNode>,
        children_of: &HashMap<i64, Vec<i64>>,
    ) -> Option<ChartNode> {
        let mut node = nodes.remove(&id)?;
        if let Some(kids) = children_of.get(&id) {
            for kid in kids {
                if let Some(child) = assemble(*kid, nodes, children_of) {
                    node.children.push(child);
                }
            }
        }
        Some(node)
    }

    let mut roots = Vec::with_capacity(root_ids.len());
    for id in root_ids {
        if let Some(node) = assemble(id, &mut nodes, &children_of) {
            roots.push(node);
        }
    }
    Ok(roots)
}

/// Balance of a node without touching the tree: leaves report their loaded
/// balance, placeholders the sum of their children.
pub fn resolve_balance(node: &ChartNode) -> Decimal {
    if !node.placeholder {
        return node.balance;
    }
    node.children.iter().map(resolve_balance).sum()
}

/// Overwrites every placeholder balance with the sum of its children, bottom-up.
pub fn aggregate_tree(roots: &mut [ChartNode]) {
    for node in roots.iter_mut() {
        aggregate_node(node);
    }
}

fn aggregate_node(node: &mut ChartNode) -> Decimal {
    if !node.placeholder {
        return node.balance;
    }
    let mut total = Decimal::ZERO;
    for child in node.children.iter_mut() {
        total += aggregate_node(child);
    }
    node.balance = total;
    total
}

pub fn balance_of(roots: &[ChartNode], name: &str) -> Option<Decimal> {
    find_node(roots, name).map(resolve_balance)
}

pub fn find_node<'a>(roots: &'a [ChartNode], name: &str) -> Option<&'a ChartNode> {
    let name = name.trim();
    for node in roots {
        if node.name == name {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, name) {
            return Some(found);
        }
    }
    None
}

pub fn find_node_by_id(roots: &[ChartNode], id: i64) -> Option<&ChartNode> {
    for node in roots {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_by_id(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Ids of the postable nodes under `node`; a leaf yields itself.
pub fn leaf_ids(node: &ChartNode) -> Vec<i64> {
    if !node.placeholder {
        return vec![node.id];
    }
    let mut ids = Vec::new();
    for child in &node.children {
        ids.extend(leaf_ids(child));
    }
    ids
}

/// Depth-first walk yielding `(depth, node)`, for indented listings.
pub fn flatten(roots: &[ChartNode]) -> Vec<(usize, &ChartNode)> {
    fn walk<'a>(nodes: &'a [ChartNode], depth: usize, out: &mut Vec<(usize, &'a ChartNode)>) {
        for node in nodes {
            out.push((depth, node));
            walk(&node.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(roots, 0, &mut out);
    out
}

pub fn add_account(conn: &Connection, ledger: &str, node: &NewChartNode) -> Result<i64> {
    add_node(conn, ledger, ChartTable::Accounts, node)
}

pub fn add_category(conn: &Connection, ledger: &str, node: &NewChartNode) -> Result<i64> {
    add_node(conn, ledger, ChartTable::Categories, node)
}

fn add_node(conn: &Connection, ledger: &str, table: ChartTable, node: &NewChartNode) -> Result<i64> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let name = node.name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid(format!("{} name is required", table.label())));
    }
    if node.kind.table() != table {
        return Err(LedgerError::invalid(format!(
            "{} is not a valid {} type",
            node.kind,
            table.label()
        )));
    }
    if node.placeholder && !node.opening_balance.is_zero() {
        return Err(LedgerError::invalid(
            "placeholder accounts cannot carry an opening balance",
        ));
    }

    let table_name = match table {
        ChartTable::Accounts => &t.accounts,
        ChartTable::Categories => &t.categories,
    };

    let parent_id = match node.parent.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(parent) => {
            let found: Option<(i64, String, bool)> = conn
                .query_row(
                    &format!(
                        "SELECT id, type, placeholder FROM {} WHERE name=?1",
                        table_name
                    ),
                    params![parent],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .optional()?;
            let Some((id, parent_kind, parent_placeholder)) = found else {
                return Err(LedgerError::constraint(format!(
                    "parent {} '{}' does not exist",
                    table.label(),
                    parent
                )));
            };
            if !parent_placeholder {
                return Err(LedgerError::constraint(format!(
                    "parent {} '{}' is not a placeholder",
                    table.label(),
                    parent
                )));
            }
            if parent_kind != node.kind.as_str() {
                return Err(LedgerError::constraint(format!(
                    "parent {} '{}' is of type {}",
                    table.label(),
                    parent,
                    parent_kind
                )));
            }
            id
        }
    };

    match table {
        ChartTable::Accounts => conn.execute(
            &format!(
                "INSERT INTO {}(name, type, placeholder, opening_balance, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table_name
            ),
            params![
                name,
                node.kind.as_str(),
                node.placeholder,
                node.opening_balance.to_string(),
                parent_id
            ],
        )?,
        ChartTable::Categories => conn.execute(
            &format!(
                "INSERT INTO {}(name, type, placeholder, parent_id) VALUES (?1, ?2, ?3, ?4)",
                table_name
            ),
            params![name, node.kind.as_str(), node.placeholder, parent_id],
        )?,
    };
    let id = conn.last_insert_rowid();
    info!(ledger, id, name, kind = node.kind.as_str(), "{} added", table.label());
    Ok(id)
}

/// Looks up a leaf account or category by name and returns its id and kind.
pub fn postable_node(
    conn: &Connection,
    ledger: &str,
    table: ChartTable,
    name: &str,
) -> Result<(i64, ChartKind)> {
    let t = LedgerTables::resolve(conn, ledger)?;
    let table_name = match table {
        ChartTable::Accounts => &t.accounts,
        ChartTable::Categories => &t.categories,
    };
    let name = name.trim();
    let found: Option<(i64, String, bool)> = conn
        .query_row(
            &format!("SELECT id, type, placeholder FROM {} WHERE name=?1", table_name),
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    match found {
        None => Err(LedgerError::not_found(format!(
            "{} '{}' in ledger '{}'",
            table.label(),
            name,
            ledger
        ))),
        Some((_, _, true)) => Err(LedgerError::constraint(format!(
            "{} '{}' is a placeholder",
            table.label(),
            name
        ))),
        Some((id, kind, false)) => Ok((id, kind.parse()?)),
    }
}

/// Resolves a chart name to the ids a query should match.
///
/// `None` means "no filter" (empty name or `.`); a placeholder expands to its
/// postable descendants.
pub(crate) fn resolve_filter_ids(
    conn: &Connection,
    ledger: &str,
    table: ChartTable,
    name: &str,
) -> Result<Option<(ChartNode, Vec<i64>)>> {
    let name = name.trim();
    if name.is_empty() || name == "." {
        return Ok(None);
    }
    let roots = build_chart(conn, ledger, table, None, false)?;
    let node = find_node(&roots, name)
        .ok_or_else(|| LedgerError::not_found(format!("{} '{}'", table.label(), name)))?;
    let ids = leaf_ids(node);
    Ok(Some((node.clone(), ids)))
}
