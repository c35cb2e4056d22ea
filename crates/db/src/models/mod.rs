//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the input DTOs its repository accepts.

pub mod audit;
pub mod managed_playlist;
pub mod source_playlist;
pub mod subscription;
pub mod user;
