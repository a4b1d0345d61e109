// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII leases that allow at most one in-flight job per storage system.
//!
//! [`SystemLocks::try_acquire`] hands out a [`SystemLease`]; dropping the
//! lease releases the system. Because the lease moves into the task that
//! runs the job, the system stays locked exactly as long as the job runs,
//! including when that task panics.

use crate::OrchestratorError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lease table shared between [`SystemLocks`] and its leases.
#[derive(Debug, Default)]
struct LeaseTable {
    held: Mutex<HashSet<String>>,
}

impl LeaseTable {
    /// The set stays consistent across a panic, so a poisoned lock is
    /// still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by `SystemLease::drop`.
    fn release(&self, system_id: &str) {
        self.lock().remove(system_id);
    }
}

/// Tracks which storage systems have a job in flight.
#[derive(Debug, Clone, Default)]
pub struct SystemLocks {
    table: Arc<LeaseTable>,
}

impl SystemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lease for `system_id`.
    ///
    /// # Errors
    /// [`OrchestratorError::SystemBusy`] if another lease for the same
    /// system is alive.
    pub fn try_acquire(&self, system_id: &str) -> Result<SystemLease, OrchestratorError> {
        let mut held = self.table.lock();
        if !held.insert(system_id.to_string()) {
            return Err(OrchestratorError::SystemBusy(system_id.to_string()));
        }
        tracing::debug!("lease acquired for system '{system_id}'");
        Ok(SystemLease {
            system_id: system_id.to_string(),
            table: Arc::clone(&self.table),
        })
    }

    /// Returns `true` if a lease for `system_id` is alive.
    pub fn is_held(&self, system_id: &str) -> bool {
        self.table.lock().contains(system_id)
    }

    /// Number of systems currently leased.
    pub fn active(&self) -> usize {
        self.table.lock().len()
    }
}

/// Exclusive right to run a job on one storage system.
pub struct SystemLease {
    system_id: String,
    table: Arc<LeaseTable>,
}

impl SystemLease {
    pub fn system_id(&self) -> &str {
        &self.system_id
    }
}

impl Drop for SystemLease {
    fn drop(&mut self) {
        self.table.release(&self.system_id);
        tracing::debug!("lease released for system '{}'", self.system_id);
    }
}

impl std::fmt::Debug for SystemLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemLease")
            .field("system_id", &self.system_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let locks = SystemLocks::new();
        let lease = locks.try_acquire("a").unwrap();
        assert_eq!(lease.system_id(), "a");
        assert!(matches!(
            locks.try_acquire("a"),
            Err(OrchestratorError::SystemBusy(id)) if id == "a"
        ));
        // Other systems are independent.
        let _b = locks.try_acquire("b").unwrap();
        assert_eq!(locks.active(), 2);
    }

    #[test]
    fn test_drop_releases() {
        let locks = SystemLocks::new();
        {
            let _lease = locks.try_acquire("a").unwrap();
            assert!(locks.is_held("a"));
        }
        assert!(!locks.is_held("a"));
        locks.try_acquire("a").unwrap();
    }

    #[test]
    fn test_clones_share_table() {
        let locks = SystemLocks::new();
        let other = locks.clone();
        let _lease = locks.try_acquire("a").unwrap();
        assert!(other.try_acquire("a").is_err());
    }

    #[test]
    fn test_lease_released_across_threads() {
        let locks = SystemLocks::new();
        let lease = locks.try_acquire("a").unwrap();
        std::thread::spawn(move || drop(lease)).join().unwrap();
        assert!(!locks.is_held("a"));
    }

    #[test]
    fn test_poisoned_table_still_leases_and_releases() {
        let locks = SystemLocks::new();
        let lease = locks.try_acquire("a").unwrap();

        let table = Arc::clone(&locks.table);
        let _ = std::thread::spawn(move || {
            let _guard = table.held.lock().unwrap();
            panic!("worker died holding the lease table");
        })
        .join();
        assert!(locks.table.held.is_poisoned());

        assert!(matches!(
            locks.try_acquire("a"),
            Err(OrchestratorError::SystemBusy(_))
        ));
        drop(lease);
        assert!(!locks.is_held("a"));
        let _again = locks.try_acquire("a").unwrap();
        assert_eq!(locks.active(), 1);
    }
}
