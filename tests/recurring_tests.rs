// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use pocketbook::commands::recurring::load_templates;
use pocketbook::models::{NewTransaction, RecurringTransaction};
use pocketbook::recurring::{
    Frequency, ScheduleError, ScheduleStore, SqliteStore, calculate_next_due,
    create_transaction_from_recurring, format_next_due, is_recurring_due, process_due_recurring,
};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn template(next_due: &str) -> RecurringTransaction {
    RecurringTransaction {
        id: 1,
        template_name: "Rent".to_string(),
        amount: Decimal::from(1200),
        currency: "USD".to_string(),
        description: "Monthly rent".to_string(),
        category_id: 1,
        location: None,
        frequency: "monthly".to_string(),
        start_date: date("2025-01-15"),
        end_date: None,
        last_created: None,
        next_due: dt(next_due),
        is_active: true,
    }
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE categories(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, icon TEXT, color TEXT);
        CREATE TABLE transactions(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            location TEXT
        );
        CREATE TABLE recurring(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            template_name TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            location TEXT,
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            last_created TEXT,
            next_due TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .unwrap();
    conn.execute("INSERT INTO categories(name) VALUES('Housing')", [])
        .unwrap();
    conn
}

fn insert_template(conn: &Connection, name: &str, frequency: &str, next_due: &str) -> i64 {
    conn.execute(
        "INSERT INTO recurring(template_name, amount, currency, description, category_id, frequency, start_date, next_due, is_active)
         VALUES (?1, '25', 'USD', ?1, 1, ?2, '2025-01-15', ?3, 1)",
        params![name, frequency, next_due],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn every_frequency_advances_strictly_forward() {
    let from = dt("2025-01-15 09:30:00");
    for name in ["daily", "weekly", "biweekly", "monthly", "quarterly", "yearly"] {
        let freq = Frequency::parse(name).unwrap();
        let next = calculate_next_due(from, freq);
        assert!(next > from, "{} did not advance", name);
        // deterministic
        assert_eq!(next, calculate_next_due(from, freq));
    }
}

#[test]
fn period_lengths_match_frequency() {
    let from = dt("2025-01-15 00:00:00");
    let cases = [
        ("daily", "2025-01-16 00:00:00"),
        ("weekly", "2025-01-22 00:00:00"),
        ("biweekly", "2025-01-29 00:00:00"),
        ("monthly", "2025-02-15 00:00:00"),
        ("quarterly", "2025-04-15 00:00:00"),
        ("yearly", "2026-01-15 00:00:00"),
    ];
    for (name, expected) in cases {
        let freq = Frequency::parse(name).unwrap();
        assert_eq!(calculate_next_due(from, freq), dt(expected), "{}", name);
    }
}

#[test]
fn monthly_clamps_at_month_end() {
    let from = dt("2025-01-31 00:00:00");
    let next = calculate_next_due(from, Frequency::Monthly);
    assert_eq!(next, dt("2025-02-28 00:00:00"));
}

#[test]
fn unrecognized_frequency_is_an_error() {
    let err = Frequency::parse("fortnightly").unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidFrequency(_)));
    assert!(err.to_string().contains("fortnightly"));
}

#[test]
fn inactive_template_is_never_due() {
    let mut t = template("2025-01-15 00:00:00");
    t.is_active = false;
    assert!(!is_recurring_due(&t, dt("2025-06-01 00:00:00")));
}

#[test]
fn expired_template_is_never_due() {
    // Scenario B: end date passed before the due check
    let mut t = template("2025-01-15 00:00:00");
    t.end_date = Some(date("2025-01-10"));
    assert!(!is_recurring_due(&t, dt("2025-01-20 00:00:00")));
}

#[test]
fn template_still_fires_on_its_end_date() {
    let mut t = template("2025-01-15 00:00:00");
    t.end_date = Some(date("2025-01-20"));
    assert!(is_recurring_due(&t, dt("2025-01-20 14:00:00")));
    assert!(!is_recurring_due(&t, dt("2025-01-21 00:00:00")));
}

#[test]
fn due_exactly_at_pointer() {
    let t = template("2025-01-15 00:00:00");
    assert!(is_recurring_due(&t, dt("2025-01-15 00:00:00")));
    assert!(!is_recurring_due(&t, dt("2025-01-14 23:59:59")));
}

#[test]
fn firing_creates_transaction_and_advances_anchor() {
    // Scenario A: due 2025-01-15, fired on the 20th, pointer moves to Feb 15
    let conn = setup();
    let id = insert_template(&conn, "Rent", "monthly", "2025-01-15 00:00:00");
    let templates = load_templates(&conn).unwrap();
    let now = dt("2025-01-20 12:30:00");

    let mut store = SqliteStore::new(&conn);
    let tx_id = create_transaction_from_recurring(&mut store, &templates[0], now).unwrap();

    let (tx_date, tx_time, tx_amount): (String, String, String) = conn
        .query_row(
            "SELECT date, time, amount FROM transactions WHERE id=?1",
            params![tx_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(tx_date, "2025-01-20");
    assert_eq!(tx_time, "12:30");
    assert_eq!(tx_amount, "25");

    let (next_due, last_created): (String, String) = conn
        .query_row(
            "SELECT next_due, last_created FROM recurring WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(next_due, "2025-02-15 00:00:00");
    assert_eq!(last_created, "2025-01-20 12:30:00");
}

#[test]
fn overdue_template_catches_up_one_period_per_run() {
    let conn = setup();
    insert_template(&conn, "Rent", "monthly", "2025-01-15 00:00:00");
    let now = dt("2025-04-10 08:00:00");

    // Three periods behind, but each run fires exactly once.
    for expected_next in [
        "2025-02-15 00:00:00",
        "2025-03-15 00:00:00",
        "2025-04-15 00:00:00",
    ] {
        let templates = load_templates(&conn).unwrap();
        let mut store = SqliteStore::new(&conn);
        let outcome = process_due_recurring(&mut store, &templates, now);
        assert_eq!(outcome.created(), 1);
        let next_due: String = conn
            .query_row("SELECT next_due FROM recurring", [], |r| r.get(0))
            .unwrap();
        assert_eq!(next_due, expected_next);
    }

    // Caught up: nothing left to fire.
    let templates = load_templates(&conn).unwrap();
    let mut store = SqliteStore::new(&conn);
    let outcome = process_due_recurring(&mut store, &templates, now);
    assert_eq!(outcome.due, 0);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

struct FlakyStore {
    writes: usize,
    fail_on: usize,
    next_id: i64,
}

impl ScheduleStore for FlakyStore {
    fn write_transaction(&mut self, _tx: &NewTransaction) -> Result<i64, ScheduleError> {
        self.writes += 1;
        if self.writes == self.fail_on {
            return Err(ScheduleError::Persistence(
                rusqlite::Error::ExecuteReturnedResults,
            ));
        }
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn advance_schedule(
        &mut self,
        _template_id: i64,
        _guard_next_due: NaiveDateTime,
        _next_due: NaiveDateTime,
        _last_created: NaiveDateTime,
    ) -> Result<(), ScheduleError> {
        Ok(())
    }
}

#[test]
fn batch_skips_failed_item_and_continues() {
    // Scenario D: 3 due templates, the 2nd write fails, the other 2 land
    let mut templates = Vec::new();
    for id in 1..=3 {
        let mut t = template("2025-01-15 00:00:00");
        t.id = id;
        templates.push(t);
    }
    let mut store = FlakyStore {
        writes: 0,
        fail_on: 2,
        next_id: 0,
    };

    let outcome = process_due_recurring(&mut store, &templates, dt("2025-01-20 00:00:00"));
    assert_eq!(outcome.due, 3);
    assert_eq!(outcome.created(), 2);
    assert_eq!(outcome.created_ids, vec![1, 2]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 2);
    assert!(matches!(outcome.failures[0].1, ScheduleError::Persistence(_)));
}

#[test]
fn corrupt_frequency_blocks_only_that_template() {
    let conn = setup();
    insert_template(&conn, "Bad", "fortnightly", "2025-01-15 00:00:00");
    insert_template(&conn, "Good", "daily", "2025-01-15 00:00:00");

    let templates = load_templates(&conn).unwrap();
    let mut store = SqliteStore::new(&conn);
    let outcome = process_due_recurring(&mut store, &templates, dt("2025-01-20 00:00:00"));

    assert_eq!(outcome.due, 2);
    assert_eq!(outcome.created(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].1,
        ScheduleError::InvalidFrequency(_)
    ));
    // the corrupt template wrote nothing
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn stale_guard_detects_concurrent_advance() {
    let conn = setup();
    let id = insert_template(&conn, "Rent", "monthly", "2025-02-15 00:00:00");

    let mut store = SqliteStore::new(&conn);
    // guard carries the pointer an overlapping firing would have seen
    let err = store
        .advance_schedule(
            id,
            dt("2025-01-15 00:00:00"),
            dt("2025-02-15 00:00:00"),
            dt("2025-01-20 00:00:00"),
        )
        .unwrap_err();
    assert!(matches!(err, ScheduleError::StaleSchedule(_)));

    // the row is untouched
    let next_due: String = conn
        .query_row("SELECT next_due FROM recurring WHERE id=?1", params![id], |r| r.get(0))
        .unwrap();
    assert_eq!(next_due, "2025-02-15 00:00:00");
}

#[test]
fn next_due_phrasing() {
    let now = dt("2025-01-15 12:00:00");
    assert_eq!(format_next_due(dt("2025-01-10 00:00:00"), now), "Overdue");
    assert_eq!(format_next_due(dt("2025-01-15 23:00:00"), now), "Today");
    assert_eq!(format_next_due(dt("2025-01-16 00:00:00"), now), "Tomorrow");
    assert_eq!(format_next_due(dt("2025-01-19 00:00:00"), now), "In 4 days");
    assert_eq!(format_next_due(dt("2025-01-29 00:00:00"), now), "In 2 weeks");
    assert_eq!(format_next_due(dt("2025-03-20 00:00:00"), now), "In 2 months");
    assert_eq!(format_next_due(dt("2027-02-15 00:00:00"), now), "In 2 years");
}
