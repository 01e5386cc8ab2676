// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring transaction scheduling.
//!
//! The scheduler is caller-triggered: there is no background timer. A batch
//! run captures `now` once, fires every due template exactly once, and
//! advances each template's schedule pointer by a single period from its old
//! anchor. A template that is several periods behind catches up one period
//! per run.

use chrono::{Days, Months, NaiveDateTime};
use rusqlite::{Connection, params};
use thiserror::Error;

use crate::models::{NewTransaction, RecurringTransaction};
use crate::utils::fmt_datetime;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("unrecognized frequency '{0}'")]
    InvalidFrequency(String),
    #[error("storage write failed: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("schedule for template {0} was advanced by another writer")]
    StaleSchedule(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// The six recognized values, lowercase. Anything else is an error,
    /// never a silent identity.
    pub fn parse(s: &str) -> Result<Self, ScheduleError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(ScheduleError::InvalidFrequency(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

/// Add exactly one period. Month-based periods use calendar arithmetic and
/// clamp at month end (Jan 31 + 1 month = Feb 28/29).
pub fn calculate_next_due(from: NaiveDateTime, frequency: Frequency) -> NaiveDateTime {
    match frequency {
        Frequency::Daily => from + Days::new(1),
        Frequency::Weekly => from + Days::new(7),
        Frequency::Biweekly => from + Days::new(14),
        Frequency::Monthly => from + Months::new(1),
        Frequency::Quarterly => from + Months::new(3),
        Frequency::Yearly => from + Months::new(12),
    }
}

/// Due check. Inactive templates never fire; a template whose end date has
/// passed is expired regardless of the active flag; otherwise due means the
/// schedule pointer is at or behind `now`.
pub fn is_recurring_due(template: &RecurringTransaction, now: NaiveDateTime) -> bool {
    if !template.is_active {
        return false;
    }
    if let Some(end) = template.end_date {
        if now.date() > end {
            return false;
        }
    }
    now >= template.next_due
}

pub fn transaction_from_template(
    template: &RecurringTransaction,
    now: NaiveDateTime,
) -> NewTransaction {
    NewTransaction {
        date: now.date(),
        time: now.format("%H:%M").to_string(),
        amount: template.amount,
        currency: template.currency.clone(),
        description: template.description.clone(),
        category_id: template.category_id,
        location: template.location.clone(),
    }
}

/// Storage collaborator for firing. Each operation is individually atomic;
/// the two writes of a firing are not jointly transactional, so the schedule
/// advance carries a guard on the old pointer to detect an overlapping
/// firing instead of double-advancing.
pub trait ScheduleStore {
    fn write_transaction(&mut self, tx: &NewTransaction) -> Result<i64, ScheduleError>;

    fn advance_schedule(
        &mut self,
        template_id: i64,
        guard_next_due: NaiveDateTime,
        next_due: NaiveDateTime,
        last_created: NaiveDateTime,
    ) -> Result<(), ScheduleError>;
}

/// Fire one template: persist a transaction copied from it, then advance
/// its schedule pointer one period from the old anchor. Errors propagate to
/// the caller; batch processing catches them per item.
pub fn create_transaction_from_recurring<S: ScheduleStore>(
    store: &mut S,
    template: &RecurringTransaction,
    now: NaiveDateTime,
) -> Result<i64, ScheduleError> {
    // Reject a corrupt frequency before any write happens.
    let frequency = Frequency::parse(&template.frequency)?;

    let record = transaction_from_template(template, now);
    let id = store.write_transaction(&record)?;

    let next_due = calculate_next_due(template.next_due, frequency);
    store.advance_schedule(template.id, template.next_due, next_due, now)?;

    Ok(id)
}

#[derive(Debug, Default)]
pub struct ProcessOutcome {
    /// How many templates were due when the batch started.
    pub due: usize,
    pub created_ids: Vec<i64>,
    pub failures: Vec<(i64, ScheduleError)>,
}

impl ProcessOutcome {
    pub fn created(&self) -> usize {
        self.created_ids.len()
    }
}

/// Fire every due template, sequentially. `now` is captured once by the
/// caller and used for the whole batch. A failed item is recorded and
/// skipped; it neither aborts the batch nor rolls back prior firings, and
/// the template stays due for the next run.
pub fn process_due_recurring<S: ScheduleStore>(
    store: &mut S,
    templates: &[RecurringTransaction],
    now: NaiveDateTime,
) -> ProcessOutcome {
    let due: Vec<&RecurringTransaction> = templates
        .iter()
        .filter(|t| is_recurring_due(t, now))
        .collect();

    let mut outcome = ProcessOutcome {
        due: due.len(),
        ..Default::default()
    };

    for template in due {
        match create_transaction_from_recurring(store, template, now) {
            Ok(id) => outcome.created_ids.push(id),
            Err(err) => outcome.failures.push((template.id, err)),
        }
    }

    outcome
}

/// SQLite-backed store over the `transactions` and `recurring` tables.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleStore for SqliteStore<'_> {
    fn write_transaction(&mut self, tx: &NewTransaction) -> Result<i64, ScheduleError> {
        self.conn.execute(
            "INSERT INTO transactions(date, time, amount, currency, description, category_id, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tx.date.to_string(),
                tx.time,
                tx.amount.to_string(),
                tx.currency,
                tx.description,
                tx.category_id,
                tx.location
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn advance_schedule(
        &mut self,
        template_id: i64,
        guard_next_due: NaiveDateTime,
        next_due: NaiveDateTime,
        last_created: NaiveDateTime,
    ) -> Result<(), ScheduleError> {
        // Compare-and-swap on the old pointer: if another session already
        // advanced it, report instead of advancing twice.
        let changed = self.conn.execute(
            "UPDATE recurring SET next_due=?1, last_created=?2 WHERE id=?3 AND next_due=?4",
            params![
                fmt_datetime(next_due),
                fmt_datetime(last_created),
                template_id,
                fmt_datetime(guard_next_due)
            ],
        )?;
        if changed == 0 {
            return Err(ScheduleError::StaleSchedule(template_id));
        }
        Ok(())
    }
}

/// Human phrasing for a template's next due date, relative to `now`.
pub fn format_next_due(next_due: NaiveDateTime, now: NaiveDateTime) -> String {
    let diff_days = (next_due.date() - now.date()).num_days();
    if diff_days < 0 {
        return "Overdue".to_string();
    }
    match diff_days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d if d < 7 => format!("In {} days", d),
        d if d < 30 => format!("In {} weeks", d / 7),
        d if d < 365 => format!("In {} months", d / 30),
        d => format!("In {} years", d / 365),
    }
}
