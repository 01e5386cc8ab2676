// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod transactions;
pub mod recurring;
pub mod budgets;
pub mod reports;
pub mod exporter;
pub mod stealth;
