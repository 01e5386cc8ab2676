// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::stealth::transform_transactions;
use crate::utils::{
    id_for_category, load_stealth_config, maybe_print_json, parse_amount, parse_month,
    pretty_table,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let cat_id = id_for_category(conn, cat)?;
    conn.execute(
        "INSERT INTO budgets(month, category_id, amount) VALUES (?1,?2,?3)
         ON CONFLICT(month, category_id) DO UPDATE SET amount=excluded.amount",
        params![month, cat_id, amount.to_string()],
    )?;
    println!("Budget set for {} / {} = {}", month, cat, amount);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut sql = String::from(
        "SELECT b.month, c.name, b.amount FROM budgets b JOIN categories c ON b.category_id=c.id",
    );
    let mut data = Vec::new();
    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" WHERE b.month=?1 ORDER BY c.name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![month], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (m, c, a) = row?;
            data.push(vec![m, c, a]);
        }
    } else {
        sql.push_str(" ORDER BY b.month DESC, c.name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (m, c, a) = row?;
            data.push(vec![m, c, a]);
        }
    }
    println!("{}", pretty_table(&["Month", "Category", "Budget"], data));
    Ok(())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let raw = sub.get_flag("raw");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;

    // Spent figures come from the same display pipeline as everything else:
    // hidden categories drop out before aggregation, scaling applies after.
    let stored = super::transactions::month_rows(conn, &month)?;
    let config = if raw { None } else { load_stealth_config(conn)? };
    let visible = transform_transactions(&stored, config.as_ref());

    let mut spent: HashMap<i64, Decimal> = HashMap::new();
    for t in &visible {
        *spent.entry(t.category_id).or_insert(Decimal::ZERO) += t.amount;
    }

    let mut cats_stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
    let cats = cats_stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;

    let mut data = Vec::new();
    for c in cats {
        let (cid, cname) = c?;
        let budget_s: Option<String> = conn
            .query_row(
                "SELECT amount FROM budgets WHERE category_id=?1 AND month=?2",
                params![cid, month],
                |r| r.get(0),
            )
            .optional()?;
        let budget = budget_s.unwrap_or("0".into());
        let used = spent.get(&cid).copied().unwrap_or(Decimal::ZERO);
        data.push(vec![cname, budget, format!("{:.2}", used)]);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Category", "Budget", "Spent"], data));
    }
    Ok(())
}
