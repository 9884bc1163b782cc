//! File-backed inventory.
//!
//! The host list is re-read on every query so that edits to the file are
//! picked up without a restart. A missing or unparsable file is an outage,
//! never an empty inventory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bmset_admission::{CandidateHost, Inventory, InventoryError, LabelSelector, Namespace};
use serde::Deserialize;
use tracing::debug;

/// On-disk layout: `{ "hosts": [CandidateHost, ...] }`.
#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    hosts: Vec<CandidateHost>,
}

/// Inventory backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<CandidateHost>, InventoryError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            InventoryError::Unavailable(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let file: InventoryFile = serde_json::from_slice(&bytes).map_err(|e| {
            InventoryError::Unavailable(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(file.hosts)
    }
}

#[async_trait]
impl Inventory for FileInventory {
    async fn find_candidates(
        &self,
        scope: &Namespace,
        selector: &LabelSelector,
    ) -> Result<Vec<CandidateHost>, InventoryError> {
        let found: Vec<_> = self
            .load()
            .await?
            .into_iter()
            .filter(|h| &h.namespace == scope && selector.matches(&h.labels))
            .collect();
        debug!(scope = %scope, found = found.len(), path = %self.path.display(), "Listed hosts");
        Ok(found)
    }

    async fn health_check(&self) -> Result<(), InventoryError> {
        self.load().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmset_admission::{Availability, HostRef};

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("bmset-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reads_hosts_and_filters() {
        let path = scratch_file(
            "filters",
            r#"{"hosts": [
                {"id": "bmh-0", "namespace": "metal3", "labels": {"role": "compute"}, "availability": "available"},
                {"id": "bmh-1", "namespace": "metal3", "labels": {"role": "storage"}, "availability": "available"},
                {"id": "bmh-2", "namespace": "other", "labels": {"role": "compute"}, "availability": "in_use_by_other"}
            ]}"#,
        );
        let inventory = FileInventory::new(&path);
        let scope = Namespace::parse("metal3").unwrap();

        let hosts = inventory
            .find_candidates(&scope, &LabelSelector::new().with("role", "compute"))
            .await
            .unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].id, HostRef::from("bmh-0"));
        assert_eq!(hosts[0].availability, Availability::Available);

        let resolved = inventory
            .resolve(&scope, &HostRef::from("bmh-1"))
            .await
            .unwrap();
        assert!(resolved.is_some());
        assert!(inventory.health_check().await.is_ok());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_outage() {
        let inventory = FileInventory::new("/nonexistent/bmset-inventory.json");
        let err = inventory.health_check().await.unwrap_err();
        assert!(matches!(err, InventoryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_garbage_file_is_an_outage() {
        let path = scratch_file("garbage", "not json");
        let inventory = FileInventory::new(&path);
        let err = inventory
            .find_candidates(&Namespace::parse("metal3").unwrap(), &LabelSelector::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Unavailable(_)));
        std::fs::remove_file(path).ok();
    }
}
