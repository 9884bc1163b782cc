//! Selection-immutability guard.
//!
//! Once any host is bound, the host namespace, label selector and hardware
//! requirements that chose it are frozen. Otherwise the set could end up
//! owning hosts its own spec would no longer select.

use serde::Serialize;

use crate::error::AdmissionError;
use crate::model::{BaremetalSet, BaremetalSetSpec};

/// A selection field that may be frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionField {
    HostNamespace,
    LabelSelector,
    HardwareRequirements,
}

impl std::fmt::Display for SelectionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionField::HostNamespace => write!(f, "hostNamespace"),
            SelectionField::LabelSelector => write!(f, "labelSelector"),
            SelectionField::HardwareRequirements => write!(f, "hardwareRequirements"),
        }
    }
}

/// Selection fields whose canonical form differs between `old` and `new`.
pub fn changed_fields(old: &BaremetalSetSpec, new: &BaremetalSetSpec) -> Vec<SelectionField> {
    let mut changed = Vec::new();
    if old.host_namespace != new.host_namespace {
        changed.push(SelectionField::HostNamespace);
    }
    if old.label_selector != new.label_selector {
        changed.push(SelectionField::LabelSelector);
    }
    if old.hardware_requirements.canonical() != new.hardware_requirements.canonical() {
        changed.push(SelectionField::HardwareRequirements);
    }
    changed
}

/// Reject selection changes while `old` has bound hosts.
pub fn check_immutability(old: &BaremetalSet, new: &BaremetalSet) -> Result<(), AdmissionError> {
    let bound = old.bound_count();
    if bound == 0 {
        return Ok(());
    }

    let fields = changed_fields(&old.spec, &new.spec);
    if fields.is_empty() {
        return Ok(());
    }

    Err(AdmissionError::ImmutableSelection { bound, fields })
}

/// Boolean form of [`check_immutability`].
pub fn is_change_allowed(old: &BaremetalSet, new: &BaremetalSet) -> bool {
    check_immutability(old, new).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HardwareRequirement, HardwareRequirements, LabelSelector};
    use bmset_id::Namespace;
    use proptest::prelude::*;

    fn spec() -> BaremetalSetSpec {
        BaremetalSetSpec::new(2, Namespace::parse("metal3").unwrap())
            .with_selector(LabelSelector::new().with("role", "compute"))
            .with_requirements(HardwareRequirements::new(vec![
                HardwareRequirement::at_least("cpu_count", 8),
                HardwareRequirement::at_least("memory_gb", 64),
            ]))
    }

    #[test]
    fn test_unbound_set_may_change_selection() {
        let old = BaremetalSet::new("compute", spec());
        let mut new = old.clone();
        new.spec.label_selector = LabelSelector::new().with("role", "storage");
        assert!(is_change_allowed(&old, &new));
    }

    #[test]
    fn test_selector_change_rejected_when_bound() {
        let old = BaremetalSet::new("compute", spec()).with_bound_hosts(["bmh-0", "bmh-1"]);
        let mut new = old.clone();
        new.spec.label_selector = LabelSelector::new().with("role", "storage");

        assert_eq!(
            check_immutability(&old, &new),
            Err(AdmissionError::ImmutableSelection {
                bound: 2,
                fields: vec![SelectionField::LabelSelector],
            })
        );
    }

    #[test]
    fn test_namespace_change_rejected_when_bound() {
        let old = BaremetalSet::new("compute", spec()).with_bound_hosts(["bmh-0"]);
        let mut new = old.clone().with_desired_count(3);
        new.spec.host_namespace = Namespace::parse("openstack").unwrap();

        let err = check_immutability(&old, &new).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot change hostNamespace while 1 hosts are bound"
        );
    }

    #[test]
    fn test_unbound_set_may_move_namespace() {
        let old = BaremetalSet::new("compute", spec());
        let mut new = old.clone();
        new.spec.host_namespace = Namespace::parse("openstack").unwrap();
        assert!(is_change_allowed(&old, &new));
    }

    #[test]
    fn test_requirement_change_rejected_when_bound() {
        let old = BaremetalSet::new("compute", spec()).with_bound_hosts(["bmh-0"]);
        let mut new = old.clone();
        new.spec.hardware_requirements = HardwareRequirements::new(vec![
            HardwareRequirement::exactly("cpu_count", 8),
            HardwareRequirement::at_least("memory_gb", 64),
        ]);
        let err = check_immutability(&old, &new).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::ImmutableSelection { ref fields, .. }
                if fields == &[SelectionField::HardwareRequirements]
        ));
    }

    #[test]
    fn test_reordered_requirements_are_not_a_change() {
        let old = BaremetalSet::new("compute", spec()).with_bound_hosts(["bmh-0"]);
        let mut new = old.clone();
        new.spec.hardware_requirements = HardwareRequirements::new(vec![
            HardwareRequirement::at_least("memory_gb", 64),
            HardwareRequirement::at_least("cpu_count", 8),
        ]);
        assert!(is_change_allowed(&old, &new));
    }

    #[test]
    fn test_other_fields_may_change_when_bound() {
        let old = BaremetalSet::new("compute", spec()).with_bound_hosts(["bmh-0"]);
        let new = old.clone().with_desired_count(7);
        assert!(is_change_allowed(&old, &new));
    }

    fn arb_selector() -> impl Strategy<Value = LabelSelector> {
        prop::collection::btree_map("[a-c]", "[x-z]", 0..3)
            .prop_map(|m| m.into_iter().collect())
    }

    fn arb_requirements() -> impl Strategy<Value = HardwareRequirements> {
        prop::collection::vec(
            ("[a-c]", 0u64..4, any::<bool>()).prop_map(|(name, min, exact_match)| {
                HardwareRequirement {
                    name,
                    min,
                    exact_match,
                }
            }),
            0..3,
        )
        .prop_map(HardwareRequirements::new)
    }

    proptest! {
        #[test]
        fn prop_bound_sets_reject_any_selection_change(
            sel_a in arb_selector(),
            sel_b in arb_selector(),
            req_a in arb_requirements(),
            req_b in arb_requirements(),
            bound in 1usize..4,
        ) {
            let ns = Namespace::parse("metal3").unwrap();
            let old = BaremetalSet::new(
                "compute",
                BaremetalSetSpec::new(bound as u32, ns.clone())
                    .with_selector(sel_a.clone())
                    .with_requirements(req_a.clone()),
            )
            .with_bound_hosts((0..bound).map(|i| format!("bmh-{i}")));
            let mut new = old.clone();
            new.spec.label_selector = sel_b.clone();
            new.spec.hardware_requirements = req_b.clone();

            let differs = sel_a != sel_b || req_a.canonical() != req_b.canonical();
            prop_assert_eq!(is_change_allowed(&old, &new), !differs);
        }
    }
}
