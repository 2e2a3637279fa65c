//! Route handlers

pub mod average;
pub mod metrics;
