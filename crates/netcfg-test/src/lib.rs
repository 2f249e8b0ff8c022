//! Test infrastructure for the netcfg tools
//!
//! Provides:
//! - xpath edit fixtures ([`EditSet`])
//! - recording mock commands and remote executors
//! - line assertion helpers for emitter output

pub mod fixtures;
mod mock;
mod verification;

pub use fixtures::*;
pub use mock::*;
pub use verification::*;
