//! # pie-common
//!
//! Shared types, configuration, error handling, and text helpers used across all pie crates.
//! This is the foundation layer: no I/O beyond loading configuration, just records and contracts.

pub mod any_row;
pub mod config;
pub mod error;
pub mod models;
pub mod text;
pub mod validation;

/// Discord snowflake identifiers (guilds, channels, roles, users) as stored in `BIGINT` columns.
pub type Snowflake = i64;
