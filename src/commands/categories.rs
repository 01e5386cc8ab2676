// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let icon = sub.get_one::<String>("icon");
            let color = sub.get_one::<String>("color");
            conn.execute(
                "INSERT INTO categories(name, icon, color) VALUES (?1, ?2, ?3)",
                params![name, icon, color],
            )?;
            println!("Added category '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt = conn
                .prepare("SELECT name, COALESCE(icon,''), COALESCE(color,'') FROM categories ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (name, icon, color) = row?;
                data.push(vec![name, icon, color]);
            }
            println!("{}", pretty_table(&["Category", "Icon", "Color"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("DELETE FROM categories WHERE name=?1", params![name])?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
