//! HTTP surface of the cylinder ledger.

pub mod app;
