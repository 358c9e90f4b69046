//! Core library for the adaptive process booster daemon.
//!
//! The daemon samples all visible processes on a fixed cadence, ranks them by a
//! weighted CPU/RAM score, optionally re-prioritizes high scorers, and publishes
//! immutable snapshots that any number of consumers can read without blocking
//! the sampling loop.

pub mod accessor;
pub mod config;
pub mod engine;
pub mod policy;
pub mod protocol;
pub mod publisher;
pub mod sampler;
pub mod score;
pub mod socket;
