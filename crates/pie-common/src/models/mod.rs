//! Records stored by pie, one type per table.
//!
//! These are the "truth" types: what the database stores and the admin tooling prints.
//! Every per-guild record is keyed by Discord snowflakes.

pub mod acl;
pub mod config;
pub mod features;
pub mod language;
pub mod spam_channel;
pub mod storage;

/// Re-export all model types for convenience.
pub use acl::*;
pub use config::*;
pub use features::*;
pub use language::*;
pub use spam_channel::*;
pub use storage::*;
