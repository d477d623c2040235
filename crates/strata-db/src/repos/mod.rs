//! Repository modules for all Strata tables.
//!
//! Each module adds methods to `StrataService` via `impl StrataService` blocks.

pub mod candidate;
pub mod digest;
pub mod item;
pub mod queue;
pub mod synthesis;
