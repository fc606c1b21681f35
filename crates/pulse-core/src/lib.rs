//! # pulse-core
//!
//! Core types, traits, and abstractions for the pulsecoach library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other pulsecoach crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod summary;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use summary::{activity_level, bp_category, daily_summary, format_bp, sleep_quality};
pub use temporal::{last_n_days, resolve_date_scope, yesterday};
pub use traits::*;
