// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the grid and everything built on it.

/// Recoverable failures reported by the index.
///
/// Contract violations (removing a payload that is not where its placement
/// says, pixel coordinates outside the representable range) are not errors:
/// they panic, because no correct caller can trigger them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The numeric configuration handed to the index is unusable.
    #[error("invalid grid configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated.
        reason: &'static str,
    },
    /// Storage for a super-region or region could not be allocated.
    #[error("failed to allocate {what} ({bytes} bytes)")]
    AllocationFailed {
        /// The kind of storage that was being allocated.
        what: &'static str,
        /// Requested size in bytes.
        bytes: usize,
    },
}

impl Error {
    pub(crate) const fn config(reason: &'static str) -> Self {
        Self::InvalidConfig { reason }
    }

    pub(crate) const fn alloc<T>(what: &'static str, count: usize) -> Self {
        Self::AllocationFailed {
            what,
            bytes: count.saturating_mul(size_of::<T>()),
        }
    }
}
