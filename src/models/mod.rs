// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod cache;
pub mod fitbit;
pub mod open_humans;
pub mod user;

pub use cache::CacheItem;
pub use fitbit::FitbitMember;
pub use open_humans::OpenHumansMember;
pub use user::User;
