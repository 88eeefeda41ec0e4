// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger core: charts, postings, stocks, transfers and stats.
//!
//! Nothing in here prints. Every operation takes the store connection and the
//! ledger name explicitly.

pub mod chart;
pub mod feeds;
pub mod stats;
pub mod stocks;
pub mod transactions;
pub mod transfer;
