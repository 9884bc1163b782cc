//! Inventory interface and in-memory implementation.
//!
//! The inventory is the external source of truth for which hosts exist,
//! what they look like, and who is using them. Admission only ever reads it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bmset_id::{HostRef, Namespace};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::{CandidateHost, LabelSelector};

/// Inventory access errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The backing store could not be reached or read.
    #[error("backing store unreachable: {0}")]
    Unavailable(String),

    /// The query did not complete in time.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

/// Read-only view of the host inventory.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// All hosts in `scope` whose labels satisfy `selector`.
    ///
    /// Callers must not rely on the order of the result.
    async fn find_candidates(
        &self,
        scope: &Namespace,
        selector: &LabelSelector,
    ) -> Result<Vec<CandidateHost>, InventoryError>;

    /// Look up a single host by reference.
    async fn resolve(
        &self,
        scope: &Namespace,
        id: &HostRef,
    ) -> Result<Option<CandidateHost>, InventoryError> {
        let hosts = self.find_candidates(scope, &LabelSelector::default()).await?;
        Ok(hosts.into_iter().find(|host| &host.id == id))
    }

    /// Cheap reachability probe used by readiness checks.
    async fn health_check(&self) -> Result<(), InventoryError> {
        Ok(())
    }
}

/// In-memory inventory for tests and development.
///
/// Can simulate an outage with [`MemoryInventory::set_reachable`] and a slow
/// store with [`MemoryInventory::with_latency`].
#[derive(Debug, Default)]
pub struct MemoryInventory {
    hosts: RwLock<BTreeMap<HostRef, CandidateHost>>,
    unreachable: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryInventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inventory holding `hosts`.
    pub fn with_hosts(hosts: impl IntoIterator<Item = CandidateHost>) -> Self {
        let hosts = hosts.into_iter().map(|h| (h.id.clone(), h)).collect();
        Self {
            hosts: RwLock::new(hosts),
            ..Self::default()
        }
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert or replace a host.
    pub async fn insert(&self, host: CandidateHost) {
        self.hosts.write().await.insert(host.id.clone(), host);
    }

    /// Remove a host, returning it if present.
    pub async fn remove(&self, id: &HostRef) -> Option<CandidateHost> {
        self.hosts.write().await.remove(id)
    }

    /// Toggle simulated reachability.
    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }

    async fn guard(&self) -> Result<(), InventoryError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable(
                "memory inventory marked unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn find_candidates(
        &self,
        scope: &Namespace,
        selector: &LabelSelector,
    ) -> Result<Vec<CandidateHost>, InventoryError> {
        self.guard().await?;
        let hosts = self.hosts.read().await;
        let found: Vec<_> = hosts
            .values()
            .filter(|h| &h.namespace == scope && selector.matches(&h.labels))
            .cloned()
            .collect();
        debug!(scope = %scope, found = found.len(), "Listed hosts");
        Ok(found)
    }

    async fn resolve(
        &self,
        scope: &Namespace,
        id: &HostRef,
    ) -> Result<Option<CandidateHost>, InventoryError> {
        self.guard().await?;
        let hosts = self.hosts.read().await;
        Ok(hosts.get(id).filter(|h| &h.namespace == scope).cloned())
    }

    async fn health_check(&self) -> Result<(), InventoryError> {
        self.guard().await
    }
}
