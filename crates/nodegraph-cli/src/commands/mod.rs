//! CLI command implementations.

pub mod common;
pub mod convert;
pub mod eval;
pub mod info;
pub mod nodes;
