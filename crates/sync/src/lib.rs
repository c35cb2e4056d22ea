//! Scheduled playlist synchronization.
//!
//! [`reconcile`] pulls new tracks from each source of one destination;
//! [`driver`] selects due destinations and runs them in bounded groups.
//! Upstream and persistence access go through the [`TrackCatalog`],
//! [`SyncStore`], and [`AccessTokenSource`] traits so the loop can run
//! against in-memory fakes.

pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod token;

#[cfg(test)]
mod test_support;

pub use catalog::TrackCatalog;
pub use config::SyncConfig;
pub use driver::{SyncDriver, SyncRequest, SyncSummary};
pub use error::SyncError;
pub use reconcile::{DestinationResult, SubscriptionResult, SyncStatus};
pub use store::{PgSyncStore, SourceRef, SyncStore, SyncTarget};
pub use token::{AccessTokenSource, TokenError};
