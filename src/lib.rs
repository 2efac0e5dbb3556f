//! rymfetch library
//!
//! Searches Soulseek through slskd for a list of albums, queues the best
//! matches, follows the transfers until they finish and files each album
//! under `Artist/Title (Year)`.

pub mod album;
pub mod config;
pub mod dispatcher;
pub mod organizer;
pub mod outcome;
pub mod reconciler;
pub mod search;
pub mod transfer;

// Re-export commonly used types for convenience
pub use album::Album;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use organizer::{OrganizeTally, Organizer};
pub use outcome::{SearchOutcome, SearchResults};
pub use reconciler::Reconciler;
pub use transfer::{SlskdClient, TransferService};
