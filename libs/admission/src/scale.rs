//! Scale admission.
//!
//! Decides whether a requested host count is achievable. Scale-ups are
//! all-or-nothing: either enough eligible hosts exist for the whole delta or
//! the request is rejected. Which hosts to release on scale-down is left to
//! the provisioning stage.

use std::collections::BTreeSet;

use bmset_events::ScaleDirection;
use bmset_id::HostRef;
use tracing::debug;

use crate::error::AdmissionError;
use crate::hardware;
use crate::model::{BaremetalSet, BaremetalSetSpec, CandidateHost};

/// Result type for admission decisions.
pub type AdmissionResult = Result<Admission, AdmissionError>;

/// An admitted count change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub direction: ScaleDirection,

    /// Bound host count before the change.
    pub previous_count: usize,

    /// Host count the set may now converge to.
    pub target_count: usize,

    /// For scale-ups: the already bound hosts followed by the hosts that would
    /// be bound, in ascending reference order. Empty otherwise.
    pub selected: Vec<HostRef>,

    /// For scale-downs: how many bound hosts the provisioning stage releases.
    pub release_count: usize,
}

impl Admission {
    fn unchanged(count: usize) -> Self {
        Self {
            direction: ScaleDirection::Unchanged,
            previous_count: count,
            target_count: count,
            selected: Vec::new(),
            release_count: 0,
        }
    }

    /// Hosts newly chosen by a scale-up.
    pub fn newly_selected(&self) -> &[HostRef] {
        let skip = self.previous_count.min(self.selected.len());
        &self.selected[skip..]
    }
}

/// Whether the requested host count differs between two revisions.
pub fn count_changed(old: &BaremetalSet, new: &BaremetalSet) -> bool {
    old.spec.desired_count != new.spec.desired_count
}

/// Candidates that could be bound by a scale-up of `spec`.
///
/// A candidate is eligible when it is available, matches the label selector
/// and the hardware requirements, and is neither in `existing_bound` nor in
/// `already_bound`. Returned in ascending reference order.
pub fn eligible_unused<'c>(
    spec: &BaremetalSetSpec,
    candidates: &'c [CandidateHost],
    existing_bound: &[CandidateHost],
    already_bound: &[HostRef],
) -> Vec<&'c CandidateHost> {
    let bound: BTreeSet<&HostRef> = existing_bound
        .iter()
        .map(|host| &host.id)
        .chain(already_bound.iter())
        .collect();

    let mut eligible: Vec<_> = candidates
        .iter()
        .filter(|host| host.is_available())
        .filter(|host| !bound.contains(&host.id))
        .filter(|host| spec.label_selector.matches(&host.labels))
        .filter(|host| hardware::matches(host, &spec.hardware_requirements))
        .collect();

    eligible.sort_by(|a, b| a.id.cmp(&b.id));
    eligible.dedup_by(|a, b| a.id == b.id);
    eligible
}

/// Decide whether `new.spec.desired_count` is admissible given `old`'s bound hosts.
///
/// An unchanged requested count is always admitted, whatever the inventory
/// says. Otherwise the size of the change is measured against the bound
/// count. Callers must have confirmed that none of `old`'s bound hosts are
/// missing from the inventory before calling with a changed count.
pub fn admit_scale(
    old: &BaremetalSet,
    new: &BaremetalSet,
    candidates: &[CandidateHost],
    existing_bound: &[CandidateHost],
) -> AdmissionResult {
    let bound = old.bound_count();
    if !count_changed(old, new) {
        return Ok(Admission::unchanged(bound));
    }

    let desired = new.spec.desired_count as usize;
    if desired == bound {
        return Ok(Admission::unchanged(bound));
    }

    if desired < bound {
        return Ok(Admission {
            direction: ScaleDirection::Down,
            previous_count: bound,
            target_count: desired,
            selected: Vec::new(),
            release_count: bound - desired,
        });
    }

    let required = desired - bound;
    let eligible = eligible_unused(
        &new.spec,
        candidates,
        existing_bound,
        &old.status.bound_hosts,
    );

    debug!(
        bound,
        desired,
        required,
        candidates = candidates.len(),
        eligible = eligible.len(),
        "Evaluated scale-up"
    );

    if eligible.len() < required {
        return Err(AdmissionError::InsufficientCandidates {
            available: eligible.len(),
            required,
            in_use: existing_bound.len().max(bound),
        });
    }

    let selected = old
        .status
        .bound_hosts
        .iter()
        .cloned()
        .chain(eligible.into_iter().take(required).map(|host| host.id.clone()))
        .collect();

    Ok(Admission {
        direction: ScaleDirection::Up,
        previous_count: bound,
        target_count: desired,
        selected,
        release_count: 0,
    })
}
