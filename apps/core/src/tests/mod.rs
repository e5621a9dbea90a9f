//! Test Module
//!
//! Test suite for the assistant core.
//!
//! ## Test Categories
//! - `brain_tests`: normalization, typo correction, code extraction, intent
//!   cascade and domain gate
//! - `database_tests`: knowledge reinforcement, analytics counters, search
//!   cache TTL
//! - `supervisor_tests`: the response pipeline over mock collaborators
//! - `integration_tests`: multi-message workflows (learning promotion,
//!   analytics aggregation)

pub mod database_tests;
pub mod supervisor_tests;
