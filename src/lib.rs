//! APPRAISER: marketplace-driven collateral valuation.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod search;
pub mod extract;
pub mod engine;
pub mod report;
pub mod storage;
