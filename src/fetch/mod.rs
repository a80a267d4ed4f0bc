//! Access to the vendor runtime distribution.
//!
//! The installer only talks to the network through [`Distribution`], so the
//! provisioning state machine can run against [`MockDistribution`] in tests
//! and assert that no network access happened.

pub mod http;
pub mod mock;

pub use http::{sha256_file, HttpFetcher};
pub use mock::MockDistribution;

use std::path::Path;

use crate::error::Result;

/// A source of runtime installer packages.
pub trait Distribution {
    /// Confirm `url` is reachable without downloading it.
    ///
    /// Fails with [`ProvisionError::Connectivity`](crate::error::ProvisionError::Connectivity).
    fn check_reachable(&self, url: &str) -> Result<()>;

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// Fails with [`ProvisionError::Download`](crate::error::ProvisionError::Download).
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}
