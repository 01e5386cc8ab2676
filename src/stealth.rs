// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Stealth mode: cosmetic, display-only masking of spending data.
//!
//! Every function here is pure and takes the config as `Option`: `None`
//! means the settings document was absent or unreadable, and the pipeline
//! falls open to showing the true data. Nothing in this module ever mutates
//! or persists anything; callers apply it to in-memory copies immediately
//! before display or aggregation.

use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::models::{AmountRange, NewTransaction, StealthConfig, Transaction};

fn apply_scaling(amount: Decimal, percentage: u32) -> Decimal {
    amount * Decimal::from(percentage) / Decimal::from(100u32)
}

/// Scale a single displayed amount. Identity unless the master flag, the
/// scaling flag, and a nonzero percentage all hold. Percentages outside the
/// settings slider's 10-100 range are passed through uncorrected.
pub fn transform_amount(amount: Decimal, config: Option<&StealthConfig>) -> Decimal {
    let Some(config) = config else {
        return amount;
    };
    if !config.enabled {
        return amount;
    }
    if config.scaling.enabled && config.scaling.percentage != 0 {
        return apply_scaling(amount, config.scaling.percentage);
    }
    amount
}

/// Whether a transaction should be suppressed from display entirely.
pub fn is_transaction_hidden(tx: &Transaction, config: Option<&StealthConfig>) -> bool {
    let Some(config) = config else {
        return false;
    };
    if !config.enabled {
        return false;
    }
    if config.hidden_categories.enabled {
        return config.hidden_categories.category_ids.contains(&tx.category_id);
    }
    false
}

/// Order-preserving subsequence of transactions that are not hidden.
pub fn filter_visible_transactions(
    transactions: &[Transaction],
    config: Option<&StealthConfig>,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| !is_transaction_hidden(t, config))
        .cloned()
        .collect()
}

/// The full display pipeline: hide first, then scale the survivors. Hiding
/// always runs before scaling so a hidden category's totals can never leak
/// through a rescaled amount.
pub fn transform_transactions(
    transactions: &[Transaction],
    config: Option<&StealthConfig>,
) -> Vec<Transaction> {
    let visible = filter_visible_transactions(transactions, config);

    let Some(config) = config else {
        return visible;
    };
    if !config.enabled || !config.scaling.enabled {
        return visible;
    }

    visible
        .into_iter()
        .map(|mut t| {
            t.amount = transform_amount(t.amount, Some(config));
            t
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct StealthStatus {
    pub active: bool,
    pub features: Vec<String>,
    pub description: String,
}

/// Descriptive summary of the active config for the settings surface.
pub fn stealth_status(config: Option<&StealthConfig>) -> StealthStatus {
    let Some(config) = config.filter(|c| c.enabled) else {
        return StealthStatus {
            active: false,
            features: Vec::new(),
            description: "Stealth mode is off".to_string(),
        };
    };

    let mut features = Vec::new();
    if config.scaling.enabled {
        features.push(format!("Scaling ({}%)", config.scaling.percentage));
    }
    if config.hidden_categories.enabled && !config.hidden_categories.category_ids.is_empty() {
        features.push(format!(
            "{} hidden categories",
            config.hidden_categories.category_ids.len()
        ));
    }
    if config.noise_injection.enabled {
        features.push(format!(
            "Noise injection ({}/day)",
            config.noise_injection.frequency
        ));
    }

    let description = if features.is_empty() {
        "Stealth mode active (no features enabled)".to_string()
    } else {
        features.join(", ")
    };

    StealthStatus {
        active: true,
        features,
        description,
    }
}

/// How many decoys should have accumulated by `now` at `per_day` per day.
/// Decoys are paced evenly across the day, so a preview at 06:00 with
/// 4/day shows one.
pub fn required_fake_count(per_day: u32, now: NaiveDateTime) -> usize {
    let elapsed = u64::from(now.time().num_seconds_from_midnight());
    (u64::from(per_day) * elapsed / 86_400) as usize
}

const DECOY_DESCRIPTIONS: &[&str] = &[
    "Coffee",
    "Lunch",
    "Groceries",
    "Gas",
    "Shopping",
    "Dinner",
    "Snacks",
    "Transportation",
];

/// Synthesize one decoy transaction for noise injection: random amount in
/// the configured range (two decimal places), random category from the
/// allowed set, stock description. Decoys are display-only and are never
/// written to storage; `None` when there is no category to disguise under.
pub fn generate_fake_transaction<R: Rng>(
    rng: &mut R,
    category_ids: &[i64],
    range: &AmountRange,
    currency: &str,
    now: NaiveDateTime,
) -> Option<NewTransaction> {
    if category_ids.is_empty() {
        return None;
    }
    let category_id = category_ids[rng.gen_range(0..category_ids.len())];
    let description = DECOY_DESCRIPTIONS[rng.gen_range(0..DECOY_DESCRIPTIONS.len())];

    let min = range.min.to_f64().unwrap_or(0.0);
    let max = range.max.to_f64().unwrap_or(0.0);
    let raw = if max > min { rng.gen_range(min..=max) } else { min };
    let amount = Decimal::try_from(raw).unwrap_or(range.min).round_dp(2);

    Some(NewTransaction {
        date: now.date(),
        time: now.format("%H:%M").to_string(),
        amount,
        currency: currency.to_string(),
        description: description.to_string(),
        category_id,
        location: None,
    })
}
