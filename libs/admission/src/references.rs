//! Bound-reference reconciliation.
//!
//! Before a set's host count may change, every host already bound to it must
//! still be accounted for in the inventory. A host that disappeared or that
//! the inventory can no longer vouch for blocks any count change until an
//! operator restores it.

use std::collections::{BTreeMap, BTreeSet};

use bmset_id::HostRef;
use tracing::warn;

use crate::error::AdmissionError;
use crate::model::{Availability, CandidateHost};

/// Live inventory records keyed by host reference.
pub type LiveHosts = BTreeMap<HostRef, CandidateHost>;

/// Classification of a bound reference against the live inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceClass {
    /// Present and reachable.
    Valid,

    /// Present but claimed by something else. Still counts as valid.
    ClaimedElsewhere,

    /// Absent, or present with unknown availability.
    Missing,
}

/// Classify a single bound reference.
pub fn classify(id: &HostRef, live: &LiveHosts) -> ReferenceClass {
    match live.get(id).map(|host| host.availability) {
        None | Some(Availability::Unknown) => ReferenceClass::Missing,
        Some(Availability::InUseByOther) => ReferenceClass::ClaimedElsewhere,
        Some(_) => ReferenceClass::Valid,
    }
}

/// Result of reconciling bound references against the live inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceReport {
    /// References that are present and reachable.
    pub still_valid: BTreeSet<HostRef>,

    /// References that are absent or unreachable.
    pub missing: BTreeSet<HostRef>,

    /// Subset of `still_valid` that the inventory reports as used elsewhere.
    pub claimed_elsewhere: BTreeSet<HostRef>,
}

impl ReferenceReport {
    /// True when nothing is missing.
    pub fn is_intact(&self) -> bool {
        self.missing.is_empty()
    }

    /// Turn a report with missing references into a hard stop.
    pub fn into_result(self, set: &str) -> Result<Self, AdmissionError> {
        if self.is_intact() {
            return Ok(self);
        }
        Err(AdmissionError::ReferenceIntegrity {
            set: set.to_string(),
            missing: self.missing.into_iter().collect(),
        })
    }

    /// Inventory records for every still-valid reference.
    pub fn resolved(&self, live: &LiveHosts) -> Vec<CandidateHost> {
        self.still_valid
            .iter()
            .filter_map(|id| live.get(id).cloned())
            .collect()
    }
}

/// Reconcile `bound` references against `live` inventory records.
///
/// Read-only; persisting the reconciled view is up to the caller.
pub fn reconcile(bound: &[HostRef], live: &LiveHosts) -> ReferenceReport {
    let mut report = ReferenceReport::default();

    for id in bound {
        match classify(id, live) {
            ReferenceClass::Missing => {
                report.missing.insert(id.clone());
            }
            ReferenceClass::ClaimedElsewhere => {
                warn!(host = %id, "Bound host is reported in use by another consumer");
                report.claimed_elsewhere.insert(id.clone());
                report.still_valid.insert(id.clone());
            }
            ReferenceClass::Valid => {
                report.still_valid.insert(id.clone());
            }
        }
    }

    report
}
