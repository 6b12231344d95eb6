//! Business logic that sits between route handlers and the database.

pub mod order_edit;
