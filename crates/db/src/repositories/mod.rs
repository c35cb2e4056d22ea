//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Default reads exclude
//! soft-deleted rows.

pub mod audit_repo;
pub mod managed_playlist_repo;
pub mod source_playlist_repo;
pub mod subscription_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use managed_playlist_repo::ManagedPlaylistRepo;
pub use source_playlist_repo::SourcePlaylistRepo;
pub use subscription_repo::SubscriptionRepo;
pub use user_repo::UserRepo;
