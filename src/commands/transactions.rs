// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Transaction;
use crate::stealth::transform_transactions;
use crate::utils::{
    id_for_category, load_stealth_config, maybe_print_json, parse_amount, parse_currency,
    parse_date, parse_time, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => now.date(),
    };
    let time = match sub.get_one::<String>("time") {
        Some(s) => parse_time(s)?,
        None => now.format("%H:%M").to_string(),
    };
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let currency = parse_currency(sub.get_one::<String>("currency").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap();
    let description = sub.get_one::<String>("description").unwrap();
    let location = sub.get_one::<String>("location").map(|s| s.to_string());

    let category_id = id_for_category(conn, category)?;

    conn.execute(
        "INSERT INTO transactions(date, time, amount, currency, description, category_id, location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            date.to_string(),
            time,
            amount.to_string(),
            currency,
            description,
            category_id,
            location
        ],
    )?;
    println!(
        "Recorded {} {} on {} '{}' ({})",
        amount, currency, date, description, category
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let raw = sub.get_flag("raw");

    let stored = query_rows(conn, sub)?;

    // Everything shown to the user goes through the stealth view first,
    // unless explicitly bypassed.
    let config = if raw { None } else { load_stealth_config(conn)? };
    let visible = transform_transactions(&stored, config.as_ref());

    let names = category_names(conn)?;
    let data: Vec<TransactionRow> = visible
        .iter()
        .map(|t| TransactionRow {
            date: t.date.to_string(),
            time: t.time.clone(),
            amount: format!("{:.2}", t.amount),
            currency: t.currency.clone(),
            description: t.description.clone(),
            category: names.get(&t.category_id).cloned().unwrap_or_default(),
            location: t.location.clone().unwrap_or_default(),
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.time.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.description.clone(),
                    r.category.clone(),
                    r.location.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Time", "Amount", "CCY", "Description", "Category", "Location"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub time: String,
    pub amount: String,
    pub currency: String,
    pub description: String,
    pub category: String,
    pub location: String,
}

pub fn category_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut names = HashMap::new();
    for row in rows {
        let (id, name) = row?;
        names.insert(id, name);
    }
    Ok(names)
}

/// Load one month of stored transactions as domain records (for the budget
/// and spending reports, which aggregate after the stealth view).
pub fn month_rows(conn: &Connection, month: &str) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, time, amount, currency, description, category_id, location
         FROM transactions WHERE substr(date,1,7)=?1 ORDER BY date, id",
    )?;
    let mut rows = stmt.query(params![month])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(1)?;
        let amount: String = r.get(3)?;
        data.push(Transaction {
            id: r.get(0)?,
            date: parse_date(&date)?,
            time: r.get(2)?,
            amount: amount
                .parse()
                .with_context(|| format!("Invalid amount '{}' in transactions", amount))?,
            currency: r.get(4)?,
            description: r.get(5)?,
            category_id: r.get(6)?,
            location: r.get(7)?,
        });
    }
    Ok(data)
}

/// Load stored transactions as domain records, newest first, honoring the
/// month/category/limit filters.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.time, t.amount, t.currency, t.description, t.category_id, t.location
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let time: String = r.get(2)?;
        let amount: String = r.get(3)?;
        let currency: String = r.get(4)?;
        let description: String = r.get(5)?;
        let category_id: i64 = r.get(6)?;
        let location: Option<String> = r.get(7)?;
        data.push(Transaction {
            id,
            date: parse_date(&date)?,
            time,
            amount: amount
                .parse()
                .with_context(|| format!("Invalid amount '{}' in transactions", amount))?,
            currency,
            description,
            category_id,
            location,
        });
    }
    Ok(data)
}
