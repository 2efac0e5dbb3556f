//! Transfer service module
//!
//! Provides the seam over the slskd download daemon: the [`TransferService`]
//! trait, its HTTP implementation and the API types it exchanges.

mod client;
mod service;
mod types;

pub use client::SlskdClient;
#[cfg(feature = "mock")]
pub use service::MockTransferService;
pub use service::{TransferError, TransferService};
pub use types::*;
