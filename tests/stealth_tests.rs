// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::models::{
    AmountRange, HiddenCategoriesConfig, NoiseInjectionConfig, ScalingConfig, StealthConfig,
    Transaction,
};
use pocketbook::stealth::{
    filter_visible_transactions, generate_fake_transaction, is_transaction_hidden,
    required_fake_count, stealth_status, transform_amount, transform_transactions,
};
use pocketbook::utils::{load_stealth_config, save_stealth_config};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn tx(id: i64, amount: i64, category_id: i64) -> Transaction {
    Transaction {
        id,
        date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        time: "12:00".to_string(),
        amount: Decimal::from(amount),
        currency: "USD".to_string(),
        description: "test".to_string(),
        category_id,
        location: None,
    }
}

fn config() -> StealthConfig {
    StealthConfig {
        enabled: true,
        scaling: ScalingConfig {
            enabled: false,
            percentage: 50,
        },
        hidden_categories: HiddenCategoriesConfig {
            enabled: false,
            category_ids: Vec::new(),
        },
        noise_injection: NoiseInjectionConfig::default(),
    }
}

#[test]
fn disabled_or_missing_config_is_identity() {
    let amount = Decimal::from(100);
    assert_eq!(transform_amount(amount, None), amount);

    let mut cfg = config();
    cfg.enabled = false;
    cfg.scaling.enabled = true;
    assert_eq!(transform_amount(amount, Some(&cfg)), amount);
}

#[test]
fn scaling_halves_amounts() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 50;
    assert_eq!(
        transform_amount(Decimal::from(100), Some(&cfg)),
        Decimal::from(50)
    );
}

#[test]
fn zero_percentage_passes_through() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 0;
    assert_eq!(
        transform_amount(Decimal::from(100), Some(&cfg)),
        Decimal::from(100)
    );
}

#[test]
fn out_of_range_percentage_is_not_corrected() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 150;
    assert_eq!(
        transform_amount(Decimal::from(100), Some(&cfg)),
        Decimal::from(150)
    );
}

#[test]
fn master_flag_gates_hiding() {
    let mut cfg = config();
    cfg.enabled = false;
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![1];
    assert!(!is_transaction_hidden(&tx(1, 10, 1), Some(&cfg)));
    assert!(!is_transaction_hidden(&tx(1, 10, 1), None));
}

#[test]
fn hidden_categories_are_filtered_in_order() {
    let mut cfg = config();
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![1];

    let all = vec![tx(1, 10, 1), tx(2, 20, 2), tx(3, 30, 1), tx(4, 40, 3)];
    let visible = filter_visible_transactions(&all, Some(&cfg));
    let ids: Vec<i64> = visible.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn filtering_is_idempotent() {
    let mut cfg = config();
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![2];

    let all = vec![tx(1, 10, 1), tx(2, 20, 2), tx(3, 30, 3)];
    let once = filter_visible_transactions(&all, Some(&cfg));
    let twice = filter_visible_transactions(&once, Some(&cfg));
    assert_eq!(once.len(), twice.len());
    assert_eq!(
        once.iter().map(|t| t.id).collect::<Vec<_>>(),
        twice.iter().map(|t| t.id).collect::<Vec<_>>()
    );
}

#[test]
fn hiding_wins_over_scaling() {
    // Scenario C: a hidden category is removed before scaling could apply
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 50;
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![1];

    let out = transform_transactions(&[tx(1, 100, 1)], Some(&cfg));
    assert!(out.is_empty());
}

#[test]
fn scaling_applies_only_to_survivors() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 50;
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![1];

    let out = transform_transactions(&[tx(1, 100, 1), tx(2, 100, 2)], Some(&cfg));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, 2);
    assert_eq!(out[0].amount, Decimal::from(50));
}

#[test]
fn transform_never_mutates_input() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 25;

    let original = vec![tx(1, 100, 1)];
    let out = transform_transactions(&original, Some(&cfg));
    assert_eq!(out[0].amount, Decimal::from(25));
    assert_eq!(original[0].amount, Decimal::from(100));
}

#[test]
fn status_scaling_only() {
    // Scenario E
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 25;

    let status = stealth_status(Some(&cfg));
    assert!(status.active);
    assert_eq!(status.features, vec!["Scaling (25%)".to_string()]);
    assert_eq!(status.description, "Scaling (25%)");
}

#[test]
fn status_off_and_unset() {
    let mut cfg = config();
    cfg.enabled = false;
    for status in [stealth_status(Some(&cfg)), stealth_status(None)] {
        assert!(!status.active);
        assert!(status.features.is_empty());
        assert_eq!(status.description, "Stealth mode is off");
    }
}

#[test]
fn status_active_without_features() {
    let status = stealth_status(Some(&config()));
    assert!(status.active);
    assert_eq!(status.description, "Stealth mode active (no features enabled)");
}

#[test]
fn status_joins_all_features() {
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 30;
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![1, 2];
    cfg.noise_injection.enabled = true;
    cfg.noise_injection.frequency = 5;

    let status = stealth_status(Some(&cfg));
    assert_eq!(
        status.description,
        "Scaling (30%), 2 hidden categories, Noise injection (5/day)"
    );
}

#[test]
fn hidden_list_without_members_is_not_a_feature() {
    let mut cfg = config();
    cfg.hidden_categories.enabled = true;
    let status = stealth_status(Some(&cfg));
    assert!(status.features.is_empty());
}

#[test]
fn decoys_stay_in_range_and_vocabulary() {
    let mut rng = rand::thread_rng();
    let range = AmountRange {
        min: Decimal::from(5),
        max: Decimal::from(10),
    };
    let categories = vec![1, 2, 3];
    let now = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();

    for _ in 0..25 {
        let decoy = generate_fake_transaction(&mut rng, &categories, &range, "USD", now).unwrap();
        assert!(decoy.amount >= range.min && decoy.amount <= range.max);
        assert!(categories.contains(&decoy.category_id));
        assert!(!decoy.description.is_empty());
        assert_eq!(decoy.date.to_string(), "2025-01-15");
    }
}

#[test]
fn decoys_are_paced_across_the_day() {
    let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let at = |h| day.and_hms_opt(h, 0, 0).unwrap();
    assert_eq!(required_fake_count(4, at(0)), 0);
    assert_eq!(required_fake_count(4, at(6)), 1);
    assert_eq!(required_fake_count(4, at(12)), 2);
    assert_eq!(required_fake_count(4, day.and_hms_opt(23, 59, 59).unwrap()), 3);
}

#[test]
fn no_decoy_without_categories() {
    let mut rng = rand::thread_rng();
    let range = AmountRange {
        min: Decimal::from(5),
        max: Decimal::from(10),
    };
    let now = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert!(generate_fake_transaction(&mut rng, &[], &range, "USD", now).is_none());
}

fn settings_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);")
        .unwrap();
    conn
}

#[test]
fn settings_roundtrip() {
    let conn = settings_conn();
    let mut cfg = config();
    cfg.scaling.enabled = true;
    cfg.scaling.percentage = 42;
    cfg.hidden_categories.enabled = true;
    cfg.hidden_categories.category_ids = vec![7];

    save_stealth_config(&conn, &cfg).unwrap();
    let loaded = load_stealth_config(&conn).unwrap().unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn corrupt_settings_document_fails_open() {
    let conn = settings_conn();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('stealth_mode', 'not json at all')",
        [],
    )
    .unwrap();
    // unreadable config means no masking, never an error
    assert!(load_stealth_config(&conn).unwrap().is_none());
}

#[test]
fn missing_settings_document_fails_open() {
    let conn = settings_conn();
    assert!(load_stealth_config(&conn).unwrap().is_none());
}

#[test]
fn partial_settings_document_fills_defaults() {
    let conn = settings_conn();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('stealth_mode', '{\"enabled\":true}')",
        [],
    )
    .unwrap();
    let cfg = load_stealth_config(&conn).unwrap().unwrap();
    assert!(cfg.enabled);
    assert!(!cfg.scaling.enabled);
    assert_eq!(cfg.scaling.percentage, 50);
}
