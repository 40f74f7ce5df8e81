//! bitso-capture: order-book spread capture agent for the Bitso markets data lake
//!
//! This library provides the core components for:
//! - Signed order book fetches from the Bitso REST API
//! - Top-of-book spread computation
//! - Hour-partitioned, append-only CSV persistence
//! - Bounded per-book capture loops with wall-clock alignment
//! - Logging and metrics

pub mod capture;
pub mod cli;
pub mod config;
pub mod exchange;
pub mod lake;
pub mod spread;
pub mod telemetry;
