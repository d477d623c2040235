//! Partial-update types for mutable rows.
//!
//! Each update struct uses `Option<T>` per field: `None` leaves the column
//! untouched.

pub mod queue;
