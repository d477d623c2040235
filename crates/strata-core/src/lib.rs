//! # strata-core
//!
//! Core types, ID prefixes, scoring and error types for Strata.
//!
//! This crate provides the foundational types shared across all Strata crates:
//! - Entity structs for items, digests, synthesis candidates, developed
//!   syntheses and queue items
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - The cross-cutting error taxonomy (`ErrorKind`)
//! - Pure scoring functions and the diversity-capped selection algorithm
//! - Report types returned by batch operations
//! - Character-safe truncation helpers

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
pub mod scoring;
pub mod selection;
pub mod text;
