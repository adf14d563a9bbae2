//! TURF: race lifecycle, participant eligibility and wager settlement.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod clock;
pub mod config;
pub mod engine;
pub mod racing;
pub mod storage;
pub mod types;
pub mod wagering;
