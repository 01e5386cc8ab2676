// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::stealth::transform_transactions;
use crate::utils::{load_stealth_config, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("spending", sub)) => spending(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct SpendingRow {
    category: String,
    amount: String,
    share: String,
}

/// Spend grouped by category for one month, with each category's share of
/// the visible total. Aggregation happens after the stealth view, so hidden
/// categories are absent and percentages are consistent with what the other
/// screens show.
fn spending(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let raw = sub.get_flag("raw");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;

    let stored = super::transactions::month_rows(conn, &month)?;
    let config = if raw { None } else { load_stealth_config(conn)? };
    let visible = transform_transactions(&stored, config.as_ref());

    let mut agg: HashMap<i64, Decimal> = HashMap::new();
    for t in &visible {
        *agg.entry(t.category_id).or_insert(Decimal::ZERO) += t.amount;
    }
    let total: Decimal = agg.values().copied().sum();

    let names = super::transactions::category_names(conn)?;
    let mut items: Vec<(String, Decimal)> = agg
        .into_iter()
        .map(|(id, amt)| (names.get(&id).cloned().unwrap_or_default(), amt))
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));

    let data: Vec<SpendingRow> = items
        .into_iter()
        .map(|(category, amount)| {
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                amount * Decimal::from(100u32) / total
            };
            SpendingRow {
                category,
                amount: format!("{:.2}", amount),
                share: format!("{:.1}%", share),
            }
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| vec![r.category.clone(), r.amount.clone(), r.share.clone()])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    }
    Ok(())
}
