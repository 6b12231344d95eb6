//! Copper Kettle admin library.
//!
//! Discount editing and order adjustment editing for the internal admin
//! panel, exposed as a library so the router can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
