// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::StealthConfig;
use crate::stealth::{generate_fake_transaction, required_fake_count, stealth_status};
use crate::utils::{
    id_for_category, load_stealth_config, maybe_print_json, parse_amount, pretty_table,
    save_stealth_config,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("on", _)) => {
            let mut config = load_or_default(conn)?;
            config.enabled = true;
            save_stealth_config(conn, &config)?;
            println!("Stealth mode on: {}", stealth_status(Some(&config)).description);
        }
        Some(("off", _)) => {
            let mut config = load_or_default(conn)?;
            config.enabled = false;
            save_stealth_config(conn, &config)?;
            println!("Stealth mode off");
        }
        Some(("status", sub)) => status(conn, sub)?,
        Some(("scale", sub)) => scale(conn, sub)?,
        Some(("hide", sub)) => hide(conn, sub, true)?,
        Some(("unhide", sub)) => hide(conn, sub, false)?,
        Some(("noise", sub)) => noise(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn load_or_default(conn: &Connection) -> Result<StealthConfig> {
    Ok(load_stealth_config(conn)?.unwrap_or_default())
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let config = load_stealth_config(conn)?;
    let status = stealth_status(config.as_ref());
    if !maybe_print_json(json_flag, jsonl_flag, &status)? {
        println!("{}", status.description);
    }
    Ok(())
}

fn scale(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut config = load_or_default(conn)?;
    if sub.get_flag("off") {
        config.scaling.enabled = false;
        save_stealth_config(conn, &config)?;
        println!("Scaling off");
        return Ok(());
    }
    match sub.get_one::<u32>("percentage") {
        Some(&pct) => {
            config.scaling.enabled = true;
            config.scaling.percentage = pct;
            save_stealth_config(conn, &config)?;
            println!("Displayed amounts will show {}% of true values", pct);
        }
        None => {
            if config.scaling.enabled {
                println!("Scaling ({}%)", config.scaling.percentage);
            } else {
                println!("Scaling off");
            }
        }
    }
    Ok(())
}

fn hide(conn: &Connection, sub: &clap::ArgMatches, hide: bool) -> Result<()> {
    let name = sub.get_one::<String>("category").unwrap();
    let id = id_for_category(conn, name)?;
    let mut config = load_or_default(conn)?;
    if hide {
        if !config.hidden_categories.category_ids.contains(&id) {
            config.hidden_categories.category_ids.push(id);
        }
        config.hidden_categories.enabled = true;
        save_stealth_config(conn, &config)?;
        println!(
            "Hiding '{}' ({} hidden categories)",
            name,
            config.hidden_categories.category_ids.len()
        );
    } else {
        config.hidden_categories.category_ids.retain(|&c| c != id);
        save_stealth_config(conn, &config)?;
        println!(
            "No longer hiding '{}' ({} hidden categories)",
            name,
            config.hidden_categories.category_ids.len()
        );
    }
    Ok(())
}

fn noise(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    if sub.get_flag("preview") {
        return preview(conn);
    }

    let mut config = load_or_default(conn)?;
    if sub.get_flag("off") {
        config.noise_injection.enabled = false;
        save_stealth_config(conn, &config)?;
        println!("Noise injection off");
        return Ok(());
    }

    if let Some(&freq) = sub.get_one::<u32>("frequency") {
        config.noise_injection.enabled = true;
        config.noise_injection.frequency = freq;
    }
    if let Some(min) = sub.get_one::<String>("min") {
        config.noise_injection.amount_range.min = parse_amount(min)?;
    }
    if let Some(max) = sub.get_one::<String>("max") {
        config.noise_injection.amount_range.max = parse_amount(max)?;
    }
    save_stealth_config(conn, &config)?;
    if config.noise_injection.enabled {
        println!(
            "Noise injection: {}/day in [{}, {}]",
            config.noise_injection.frequency,
            config.noise_injection.amount_range.min,
            config.noise_injection.amount_range.max
        );
    } else {
        println!("Noise injection off");
    }
    Ok(())
}

// The only place decoys surface. They are generated, printed, and dropped;
// nothing is written.
fn preview(conn: &Connection) -> Result<()> {
    let config = load_or_default(conn)?;
    if !config.enabled || !config.noise_injection.enabled {
        println!("Noise injection is not active");
        return Ok(());
    }

    let names = super::transactions::category_names(conn)?;
    let category_ids: Vec<i64> = names.keys().copied().collect();
    let now = chrono::Local::now().naive_local();
    let mut rng = rand::thread_rng();

    let count = required_fake_count(config.noise_injection.frequency, now);
    let mut data = Vec::new();
    for _ in 0..count {
        if let Some(decoy) = generate_fake_transaction(
            &mut rng,
            &category_ids,
            &config.noise_injection.amount_range,
            "USD",
            now,
        ) {
            data.push(vec![
                decoy.date.to_string(),
                decoy.time.clone(),
                format!("{:.2}", decoy.amount),
                decoy.description.clone(),
                names.get(&decoy.category_id).cloned().unwrap_or_default(),
            ]);
        }
    }
    println!(
        "{}",
        pretty_table(&["Date", "Time", "Amount", "Description", "Category"], data)
    );
    println!("Decoys are display-only and are never stored");
    Ok(())
}
