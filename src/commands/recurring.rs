// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::RecurringTransaction;
use crate::recurring::{Frequency, SqliteStore, format_next_due, process_due_recurring};
use crate::utils::{
    fmt_datetime, id_for_category, maybe_print_json, parse_amount, parse_currency, parse_date,
    parse_datetime, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let removed = conn.execute("DELETE FROM recurring WHERE id=?1", params![id])?;
            if removed == 0 {
                return Err(anyhow!("Template {} not found", id));
            }
            println!("Removed template {}", id);
        }
        Some(("pause", sub)) => set_active(conn, sub, false)?,
        Some(("resume", sub)) => set_active(conn, sub, true)?,
        Some(("run", _)) => run(conn)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let currency = parse_currency(sub.get_one::<String>("currency").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap();
    let description = sub.get_one::<String>("description").unwrap();
    let location = sub.get_one::<String>("location").map(|s| s.to_string());
    // Validate up front so a bad value can never reach a stored row.
    let frequency = Frequency::parse(sub.get_one::<String>("frequency").unwrap())
        .map_err(|e| anyhow!("{}", e))?;
    let start = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s))
        .transpose()?;

    let category_id = id_for_category(conn, category)?;
    // The schedule pointer starts at the start date.
    let next_due = start.and_time(NaiveTime::MIN);

    conn.execute(
        "INSERT INTO recurring(template_name, amount, currency, description, category_id,
                               location, frequency, start_date, end_date, next_due, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1)",
        params![
            name,
            amount.to_string(),
            currency,
            description,
            category_id,
            location,
            frequency.as_str(),
            start.to_string(),
            end.map(|d| d.to_string()),
            fmt_datetime(next_due)
        ],
    )?;
    println!(
        "Added recurring template '{}' ({}), first due {}",
        name,
        frequency.as_str(),
        start
    );
    Ok(())
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let changed = conn.execute(
        "UPDATE recurring SET is_active=?1 WHERE id=?2",
        params![active as i64, id],
    )?;
    if changed == 0 {
        return Err(anyhow!("Template {} not found", id));
    }
    println!(
        "Template {} {}",
        id,
        if active { "resumed" } else { "paused" }
    );
    Ok(())
}

#[derive(Serialize)]
struct TemplateRow {
    id: i64,
    template_name: String,
    amount: String,
    currency: String,
    category: String,
    frequency: String,
    next_due: String,
    active: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let now = chrono::Local::now().naive_local();

    let templates = load_templates(conn)?;
    let names = super::transactions::category_names(conn)?;

    let data: Vec<TemplateRow> = templates
        .iter()
        .map(|t| TemplateRow {
            id: t.id,
            template_name: t.template_name.clone(),
            amount: format!("{:.2}", t.amount),
            currency: t.currency.clone(),
            category: names.get(&t.category_id).cloned().unwrap_or_default(),
            frequency: t.frequency.clone(),
            next_due: format_next_due(t.next_due, now),
            active: t.is_active,
        })
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.template_name.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                    r.frequency.clone(),
                    r.next_due.clone(),
                    if r.active { "yes".into() } else { "paused".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Template", "Amount", "CCY", "Category", "Frequency", "Next due", "Active"],
                rows,
            )
        );
    }
    Ok(())
}

fn run(conn: &Connection) -> Result<()> {
    let templates = load_templates(conn)?;
    // One clock reading for the whole batch: a template due now stays due
    // for every item, however long processing takes.
    let now = chrono::Local::now().naive_local();

    let mut store = SqliteStore::new(conn);
    let outcome = process_due_recurring(&mut store, &templates, now);

    for (id, err) in &outcome.failures {
        eprintln!("Skipped template {}: {}", id, err);
    }
    println!("Created {} of {} due", outcome.created(), outcome.due);
    Ok(())
}

/// Load every template. A totally unreadable table is an error; a single
/// bad frequency value is not (it is carried as text and fails alone at
/// fire time).
pub fn load_templates(conn: &Connection) -> Result<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, template_name, amount, currency, description, category_id, location,
                frequency, start_date, end_date, last_created, next_due, is_active
         FROM recurring ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut templates = Vec::new();
    while let Some(r) = rows.next()? {
        let amount: String = r.get(2)?;
        let start_date: String = r.get(8)?;
        let end_date: Option<String> = r.get(9)?;
        let last_created: Option<String> = r.get(10)?;
        let next_due: String = r.get(11)?;
        templates.push(RecurringTransaction {
            id: r.get(0)?,
            template_name: r.get(1)?,
            amount: amount
                .parse()
                .with_context(|| format!("Invalid amount '{}' in recurring", amount))?,
            currency: r.get(3)?,
            description: r.get(4)?,
            category_id: r.get(5)?,
            location: r.get(6)?,
            frequency: r.get(7)?,
            start_date: parse_date(&start_date)?,
            end_date: end_date.map(|s| parse_date(&s)).transpose()?,
            last_created: last_created.map(|s| parse_datetime(&s)).transpose()?,
            next_due: parse_datetime(&next_due)?,
            is_active: r.get::<_, i64>(12)? != 0,
        });
    }
    Ok(templates)
}
