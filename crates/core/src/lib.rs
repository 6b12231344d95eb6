//! Copper Kettle Core - Shared domain types.
//!
//! This crate provides the types used across the Copper Kettle components:
//! - `admin` - Internal administration panel (discount editing, order editing)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Database encodings are available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, discount and adjustment types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
