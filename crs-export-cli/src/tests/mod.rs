//! Shared test harness modules for the `crs-export` CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod batch_unit;
mod helpers;
