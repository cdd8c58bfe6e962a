// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod open_humans;

pub use open_humans::{
    OpenHumansClient, OpenHumansService, RefreshOutcome, RefreshSummary, TokenRefresh,
    TokenRefreshResponse,
};
