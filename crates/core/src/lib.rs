//! Domain building blocks shared by every PlaylistFox crate.
//!
//! This crate has zero internal dependencies so the database layer, the
//! sync engine, and the HTTP server can all depend on it.

pub mod audit;
pub mod error;
pub mod pagination;
pub mod scheduling;
pub mod selection;
pub mod types;
pub mod webhook_signature;
