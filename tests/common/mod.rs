//! Common test infrastructure
//!
//! Everything end-to-end tests need to drive the dispatcher, reconciler and
//! organizer without a running slskd daemon. Tests should only import from
//! this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeTransferService, TestLibrary, ALBUM_1};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let library = TestLibrary::new();
//!     let service = FakeTransferService::new();
//!     // ...
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;
mod transfer_service;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{candidate, directory_report, results, ManualClock, TestLibrary};
pub use transfer_service::FakeTransferService;
