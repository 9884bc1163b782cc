//! Admission pipeline for create, update and delete of bare-metal sets.
//!
//! Each request runs sequentially: name check, selection guard, reference
//! reconciliation (only when the count changes), then scale admission (only
//! when the count grows). Nothing is retried; the caller decides whether to
//! resubmit.

use std::sync::Arc;
use std::time::Duration;

use bmset_events::{AdmissionOutcomePayload, EventEnvelope, Operation, ScaleDirection};
use bmset_id::{validate_label_name, HostRef, Namespace, RequestId};
use tracing::{debug, info, instrument, warn};

use crate::error::AdmissionError;
use crate::immutability::check_immutability;
use crate::inventory::{Inventory, InventoryError};
use crate::model::{BaremetalSet, BaremetalSetSpec, CandidateHost, SelectionFingerprint};
use crate::notify::EventSink;
use crate::references::{self, LiveHosts};
use crate::scale::{admit_scale, count_changed, Admission, AdmissionResult};

/// Default bound on a single inventory query.
pub const DEFAULT_INVENTORY_TIMEOUT: Duration = Duration::from_secs(5);

/// Validator configuration.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Upper bound on each inventory call. Expiry fails the admission.
    pub inventory_timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            inventory_timeout: DEFAULT_INVENTORY_TIMEOUT,
        }
    }
}

/// Per-request metadata carried into admission events.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub request_id: RequestId,
    pub correlation_id: Option<String>,
}

/// Admission validator.
///
/// Holds no mutable state, so one instance can serve concurrent requests for
/// different sets.
#[derive(Clone)]
pub struct Validator {
    inventory: Arc<dyn Inventory>,
    sink: Arc<dyn EventSink>,
    config: ValidatorConfig,
}

impl Validator {
    /// Create a new validator.
    pub fn new(
        inventory: Arc<dyn Inventory>,
        sink: Arc<dyn EventSink>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            inventory,
            sink,
            config,
        }
    }

    /// The inventory this validator reads from.
    pub fn inventory(&self) -> &Arc<dyn Inventory> {
        &self.inventory
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Admit a newly created set.
    #[instrument(skip_all, fields(set = %new.name, namespace = %new.spec.host_namespace))]
    pub async fn validate_create(&self, new: &BaremetalSet, meta: &RequestMeta) -> AdmissionResult {
        let result = self.admit_create(new).await;
        self.publish(Operation::Create, None, new, &result, meta);
        result
    }

    /// Admit an update from `old` to `new`.
    #[instrument(skip_all, fields(set = %new.name, namespace = %new.spec.host_namespace))]
    pub async fn validate_update(
        &self,
        old: &BaremetalSet,
        new: &BaremetalSet,
        meta: &RequestMeta,
    ) -> AdmissionResult {
        let result = self.admit_update(old, new).await;
        self.publish(Operation::Update, Some(old), new, &result, meta);
        result
    }

    /// Observe a deletion. Deletes are never checked.
    #[instrument(skip_all, fields(set = %old.name, namespace = %old.spec.host_namespace))]
    pub fn validate_delete(&self, old: &BaremetalSet, meta: &RequestMeta) {
        info!(bound = old.bound_count(), "Delete allowed");
        let result = Ok(Admission {
            direction: ScaleDirection::Down,
            previous_count: old.bound_count(),
            target_count: 0,
            selected: Vec::new(),
            release_count: old.bound_count(),
        });
        self.publish(Operation::Delete, Some(old), old, &result, meta);
    }

    async fn admit_create(&self, new: &BaremetalSet) -> AdmissionResult {
        check_name(new)?;

        let empty = new.unbound();
        if new.spec.desired_count == 0 {
            return admit_scale(&empty, new, &[], &[]);
        }

        let candidates = self.find_candidates(&new.spec).await?;
        admit_scale(&empty, new, &candidates, &[])
    }

    async fn admit_update(&self, old: &BaremetalSet, new: &BaremetalSet) -> AdmissionResult {
        check_name(new)?;
        check_immutability(old, new)?;

        if !count_changed(old, new) {
            return admit_scale(old, new, &[], &[]);
        }

        // The guard freezes the namespace while hosts are bound, so bound hosts
        // and candidates are looked up in the same scope.
        let scope = &new.spec.host_namespace;
        let live = self.resolve_bound(scope, &old.status.bound_hosts).await?;
        let report = references::reconcile(&old.status.bound_hosts, &live).into_result(&new.name)?;

        if new.spec.desired_count as usize <= old.bound_count() {
            return admit_scale(old, new, &[], &[]);
        }

        let existing = report.resolved(&live);
        let candidates = self.find_candidates(&new.spec).await?;
        admit_scale(old, new, &candidates, &existing)
    }

    async fn find_candidates(
        &self,
        spec: &BaremetalSetSpec,
    ) -> Result<Vec<CandidateHost>, AdmissionError> {
        let query = self
            .inventory
            .find_candidates(&spec.host_namespace, &spec.label_selector);
        let hosts = tokio::time::timeout(self.config.inventory_timeout, query)
            .await
            .map_err(|_| InventoryError::Timeout(self.config.inventory_timeout))??;
        debug!(candidates = hosts.len(), "Fetched candidate hosts");
        Ok(hosts)
    }

    async fn resolve_bound(
        &self,
        scope: &Namespace,
        bound: &[HostRef],
    ) -> Result<LiveHosts, AdmissionError> {
        let mut live = LiveHosts::new();
        for id in bound {
            let lookup = self.inventory.resolve(scope, id);
            let host = tokio::time::timeout(self.config.inventory_timeout, lookup)
                .await
                .map_err(|_| InventoryError::Timeout(self.config.inventory_timeout))??;
            if let Some(host) = host {
                live.insert(id.clone(), host);
            }
        }
        debug!(bound = bound.len(), resolved = live.len(), "Resolved bound hosts");
        Ok(live)
    }

    fn publish(
        &self,
        operation: Operation,
        old: Option<&BaremetalSet>,
        new: &BaremetalSet,
        result: &AdmissionResult,
        meta: &RequestMeta,
    ) {
        let bound_count = old.map(BaremetalSet::bound_count).unwrap_or(0);
        let mut payload = AdmissionOutcomePayload {
            operation,
            admitted: result.is_ok(),
            bound_count: u32::try_from(bound_count).unwrap_or(u32::MAX),
            desired_count: new.spec.desired_count,
            direction: None,
            selected_hosts: Vec::new(),
            selection_fingerprint: Some(SelectionFingerprint::of(&new.spec).to_string()),
            reason: None,
            message: None,
        };

        match result {
            Ok(admission) => {
                if operation != Operation::Delete {
                    info!(
                        operation = %operation,
                        direction = %admission.direction,
                        target_count = admission.target_count,
                        "Admission granted"
                    );
                }
                payload.direction = Some(admission.direction);
                payload.selected_hosts = admission.newly_selected().to_vec();
            }
            Err(e) => {
                warn!(
                    operation = %operation,
                    reason = e.reason(),
                    error = %e,
                    "Admission rejected"
                );
                payload.reason = Some(e.reason().to_string());
                payload.message = Some(e.to_string());
            }
        }

        let mut builder = EventEnvelope::builder()
            .subject(&new.spec.host_namespace, &new.name)
            .event_type(payload.event_type())
            .request_id(meta.request_id)
            .payload(payload);
        if let Some(correlation_id) = &meta.correlation_id {
            builder = builder.correlation_id(correlation_id.clone());
        }

        match builder.build() {
            Ok(event) => self.sink.emit(event),
            Err(e) => warn!(error = %e, "Failed to build admission event"),
        }
    }
}

fn check_name(set: &BaremetalSet) -> Result<(), AdmissionError> {
    validate_label_name(&set.name).map_err(|source| AdmissionError::NameSyntax {
        field: "name",
        value: set.name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MemoryInventory;
    use crate::model::{Availability, LabelSelector};
    use crate::notify::MemorySink;
    use bmset_events::{event_types, ScaleDirection};

    fn ns() -> Namespace {
        Namespace::parse("metal3").unwrap()
    }

    fn host(id: &str) -> CandidateHost {
        CandidateHost::new(id, ns()).with_label("role", "compute")
    }

    fn validator(inventory: MemoryInventory) -> (Validator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let validator = Validator::new(
            Arc::new(inventory),
            sink.clone(),
            ValidatorConfig {
                inventory_timeout: Duration::from_millis(200),
            },
        );
        (validator, sink)
    }

    fn set(name: &str, desired: u32) -> BaremetalSet {
        BaremetalSet::new(
            name,
            BaremetalSetSpec::new(desired, ns())
                .with_selector(LabelSelector::new().with("role", "compute")),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_bad_name() {
        let (validator, sink) = validator(MemoryInventory::new());
        let err = validator
            .validate_create(&set("Compute_Set", 0), &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "name_syntax");
        assert_eq!(sink.events()[0].event_type, event_types::SET_REJECTED);
    }

    #[tokio::test]
    async fn test_create_zero_count_skips_inventory() {
        let inventory = MemoryInventory::new();
        inventory.set_reachable(false);
        let (validator, _) = validator(inventory);
        let admission = validator
            .validate_create(&set("compute", 0), &RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(admission.direction, ScaleDirection::Unchanged);
    }

    #[tokio::test]
    async fn test_create_checks_initial_count() {
        let (validator, sink) = validator(MemoryInventory::with_hosts([host("a"), host("b")]));
        let admission = validator
            .validate_create(&set("compute", 2), &RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(admission.target_count, 2);

        let err = validator
            .validate_create(&set("compute", 3), &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionError::InsufficientCandidates {
                available: 2,
                required: 3,
                in_use: 0,
            }
        );

        let events = sink.events();
        assert_eq!(events[0].event_type, event_types::SET_CREATE_ADMITTED);
        assert_eq!(events[0].payload.selected_hosts.len(), 2);
        assert_eq!(events[1].event_type, event_types::SET_REJECTED);
        assert_eq!(
            events[1].payload.reason.as_deref(),
            Some("insufficient_candidates")
        );
    }

    #[tokio::test]
    async fn test_create_surfaces_inventory_outage() {
        let inventory = MemoryInventory::with_hosts([host("a")]);
        inventory.set_reachable(false);
        let (validator, _) = validator(inventory);
        let err = validator
            .validate_create(&set("compute", 1), &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_inventory_times_out() {
        let inventory =
            MemoryInventory::with_hosts([host("a")]).with_latency(Duration::from_secs(30));
        let (validator, _) = validator(inventory);
        let err = validator
            .validate_create(&set("compute", 1), &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionError::InventoryUnavailable(InventoryError::Timeout(Duration::from_millis(
                200
            )))
        );
    }

    #[tokio::test]
    async fn test_update_without_count_change_skips_inventory() {
        let inventory = MemoryInventory::new();
        inventory.set_reachable(false);
        let (validator, _) = validator(inventory);
        let old = set("compute", 2).with_bound_hosts(["a", "b"]);
        let admission = validator
            .validate_update(&old, &old, &RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(admission.target_count, 2);
    }

    #[tokio::test]
    async fn test_resubmitted_update_admitted_while_binding_lags() {
        // Two requested, none bound yet, and the inventory has nothing free.
        let inventory = MemoryInventory::with_hosts([
            host("a").with_availability(Availability::InUseByThisSet),
            host("b").with_availability(Availability::InUseByThisSet),
        ]);
        inventory.set_reachable(false);
        let (validator, sink) = validator(inventory);
        let s = set("compute", 2);

        let admission = validator
            .validate_update(&s, &s, &RequestMeta::default())
            .await
            .unwrap();
        assert_eq!(admission.direction, ScaleDirection::Unchanged);
        assert_eq!(admission.target_count, 0);
        assert_eq!(sink.events()[0].event_type, event_types::SET_UPDATE_ADMITTED);
    }

    #[tokio::test]
    async fn test_outage_while_resolving_bound_hosts() {
        let inventory = MemoryInventory::with_hosts([
            host("a").with_availability(Availability::InUseByThisSet),
            host("b").with_availability(Availability::InUseByThisSet),
        ]);
        inventory.set_reachable(false);
        let (validator, _) = validator(inventory);
        let old = set("compute", 2).with_bound_hosts(["a", "b"]);

        for desired in [1, 3] {
            let new = old.clone().with_desired_count(desired);
            let err = validator
                .validate_update(&old, &new, &RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AdmissionError::InventoryUnavailable(InventoryError::Unavailable(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_slow_resolution_of_bound_hosts_times_out() {
        let inventory =
            MemoryInventory::with_hosts([host("a").with_availability(Availability::InUseByThisSet)])
                .with_latency(Duration::from_secs(30));
        let (validator, _) = validator(inventory);
        let old = set("compute", 1).with_bound_hosts(["a"]);
        let new = old.clone().with_desired_count(0);

        let err = validator
            .validate_update(&old, &new, &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "inventory_unavailable");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_update_guard_runs_before_inventory() {
        let inventory = MemoryInventory::new();
        inventory.set_reachable(false);
        let (validator, _) = validator(inventory);
        let old = set("compute", 2).with_bound_hosts(["a", "b"]);
        let mut new = old.clone().with_desired_count(3);
        new.spec.label_selector = LabelSelector::new().with("role", "storage");

        let err = validator
            .validate_update(&old, &new, &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "immutable_selection");
    }

    #[tokio::test]
    async fn test_scale_down_blocked_by_missing_reference() {
        let inventory = MemoryInventory::with_hosts([
            host("a").with_availability(Availability::InUseByThisSet),
            host("b").with_availability(Availability::Unknown),
        ]);
        let (validator, _) = validator(inventory);
        let old = set("compute", 2).with_bound_hosts(["a", "b"]);
        let new = old.clone().with_desired_count(1);

        let err = validator
            .validate_update(&old, &new, &RequestMeta::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionError::ReferenceIntegrity {
                set: "compute".to_string(),
                missing: vec![HostRef::from("b")],
            }
        );
    }

    #[tokio::test]
    async fn test_events_carry_correlation_id() {
        let (validator, sink) = validator(MemoryInventory::new());
        let meta = RequestMeta {
            request_id: RequestId::new(),
            correlation_id: Some("review-uid".to_string()),
        };
        validator.validate_delete(&set("compute", 1).with_bound_hosts(["a"]), &meta);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, event_types::SET_DELETE_OBSERVED);
        assert_eq!(events[0].correlation_id.as_deref(), Some("review-uid"));
        assert_eq!(events[0].request_id, meta.request_id);
        assert_eq!(events[0].subject, "metal3/compute");
    }
}
