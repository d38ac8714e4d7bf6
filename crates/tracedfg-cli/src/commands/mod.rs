//! CLI command implementations.

pub mod check;
pub mod common;
pub mod convert;
pub mod nodes;
pub mod run;
pub mod types;
