//! # tally-core
//!
//! Core types, validation, scoring, and change detection for Tally.
//!
//! This crate provides the foundational types shared across all Tally crates:
//! - Entity structs for persisted decisions and their weighted arguments
//! - Bounded value types (`Weight`, validated titles and texts)
//! - The scoring engine that turns an argument list into a recommendation
//! - Draft snapshots and the change detector used by auto-save
//! - ID prefix constants
//! - Cross-cutting error types

pub mod draft;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod scoring;
pub mod validation;
