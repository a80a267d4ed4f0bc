//! In-memory distribution for testing.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

use crate::error::{ProvisionError, Result};

use super::Distribution;

/// A distribution that serves a fixed payload and records every access.
#[derive(Debug, Default)]
pub struct MockDistribution {
    payload: Vec<u8>,
    unreachable: bool,
    reachability_checks: Cell<usize>,
    downloads: RefCell<Vec<String>>,
}

impl MockDistribution {
    /// A reachable distribution serving `payload` for every URL.
    pub fn serving(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// A distribution whose reachability check always fails.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Total number of calls of either kind.
    pub fn access_count(&self) -> usize {
        self.reachability_checks.get() + self.downloads.borrow().len()
    }

    /// URLs downloaded so far.
    pub fn downloaded(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl Distribution for MockDistribution {
    fn check_reachable(&self, url: &str) -> Result<()> {
        self.reachability_checks.set(self.reachability_checks.get() + 1);
        if self.unreachable {
            return Err(ProvisionError::Connectivity {
                url: url.to_string(),
                message: "unreachable (mock)".to_string(),
            });
        }
        Ok(())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.downloads.borrow_mut().push(url.to_string());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, &self.payload)?;
        Ok(self.payload.len() as u64)
    }
}
