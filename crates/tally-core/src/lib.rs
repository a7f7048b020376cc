//! # tally-core
//!
//! Core types and error types for Tally.
//!
//! This crate provides the foundational types shared across all Tally crates:
//! - The `Task` entity as stored and served
//! - Validated creation and partial-update inputs (`NewTask`, `TaskPatch`)
//! - Cross-cutting error types

pub mod entities;
pub mod errors;
pub mod input;
