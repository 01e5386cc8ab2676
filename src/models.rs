// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// One money movement. Amounts are positive and stay in the currency they
/// were recorded in; display-time masking never touches the stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub time: String, // HH:MM
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub category_id: i64,
    pub location: Option<String>,
}

/// A transaction about to be written (no id yet). Also the shape of noise
/// decoys, which are never written at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub time: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub category_id: i64,
    pub location: Option<String>,
}

/// A recipe for periodically generating transactions.
///
/// `frequency` stays as text so a row carrying an unrecognized value is
/// still loadable and fails alone at fire time instead of poisoning the
/// whole template list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub template_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub category_id: i64,
    pub location: Option<String>,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub last_created: Option<NaiveDateTime>,
    pub next_due: NaiveDateTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub month: String, // YYYY-MM
    pub category_id: i64,
    pub amount: Decimal,
}

/// Display-only masking settings, stored as one JSON document in the
/// settings table. Every field defaults so a partial document still loads;
/// an unparsable document loads as no config at all (fail open).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    pub enabled: bool,
    pub scaling: ScalingConfig,
    pub hidden_categories: HiddenCategoriesConfig,
    pub noise_injection: NoiseInjectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub enabled: bool,
    /// Fraction of the true amount to show, 0-100 from the settings surface.
    /// Out-of-range values are passed through uncorrected.
    pub percentage: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            percentage: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenCategoriesConfig {
    pub enabled: bool,
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseInjectionConfig {
    pub enabled: bool,
    /// Decoy transactions per day.
    pub frequency: u32,
    pub amount_range: AmountRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountRange {
    pub min: Decimal,
    pub max: Decimal,
}
