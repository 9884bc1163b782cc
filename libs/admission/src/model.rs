//! Bare-metal set and candidate host types.

use std::collections::BTreeMap;

use bmset_id::{HostRef, Namespace};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// Selection criteria
// =============================================================================

/// Conjunction of `key=value` label constraints.
///
/// Stored as a sorted map, so two selectors with the same constraints compare
/// equal regardless of the order they were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    /// A selector that matches every host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// True iff every constraint is present in `labels` with the same value.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSelector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A single named hardware threshold, e.g. `cpu_count >= 8`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareRequirement {
    /// Profile key this requirement applies to.
    pub name: String,

    /// Minimum observed value (or the required value when `exact_match`).
    pub min: u64,

    /// Require the observed value to equal `min` instead of exceeding it.
    #[serde(default)]
    pub exact_match: bool,
}

impl HardwareRequirement {
    /// A threshold requirement: observed value must be `>= min`.
    pub fn at_least(name: impl Into<String>, min: u64) -> Self {
        Self {
            name: name.into(),
            min,
            exact_match: false,
        }
    }

    /// An exact requirement: observed value must be `== value`.
    pub fn exactly(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            min: value,
            exact_match: true,
        }
    }

    /// Whether an observed profile value satisfies this requirement.
    ///
    /// A missing value never satisfies.
    pub fn is_met_by(&self, observed: Option<u64>) -> bool {
        match observed {
            Some(value) if self.exact_match => value == self.min,
            Some(value) => value >= self.min,
            None => false,
        }
    }
}

impl std::fmt::Display for HardwareRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = if self.exact_match { "==" } else { ">=" };
        write!(f, "{} {} {}", self.name, op, self.min)
    }
}

/// Ordered list of hardware requirements.
///
/// Order is kept as written, but comparisons that matter for admission go
/// through [`HardwareRequirements::canonical`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareRequirements(Vec<HardwareRequirement>);

impl HardwareRequirements {
    pub fn new(requirements: Vec<HardwareRequirement>) -> Self {
        Self(requirements)
    }

    /// Appends a requirement.
    pub fn with(mut self, requirement: HardwareRequirement) -> Self {
        self.0.push(requirement);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &HardwareRequirement> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requirements sorted by `(name, min, exact_match)`.
    pub fn canonical(&self) -> Vec<HardwareRequirement> {
        let mut sorted = self.0.clone();
        sorted.sort();
        sorted
    }
}

impl FromIterator<HardwareRequirement> for HardwareRequirements {
    fn from_iter<I: IntoIterator<Item = HardwareRequirement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Bare-metal set
// =============================================================================

/// Desired state of a bare-metal set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaremetalSetSpec {
    /// Number of hosts the set should own.
    pub desired_count: u32,

    /// Namespace candidate hosts are drawn from.
    pub host_namespace: Namespace,

    #[serde(default)]
    pub label_selector: LabelSelector,

    #[serde(default)]
    pub hardware_requirements: HardwareRequirements,
}

/// Observed state of a bare-metal set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaremetalSetStatus {
    /// Hosts currently bound to the set, in binding order.
    #[serde(default)]
    pub bound_hosts: Vec<HostRef>,
}

/// A logical pool of bare-metal hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaremetalSet {
    pub name: String,
    pub spec: BaremetalSetSpec,
    #[serde(default)]
    pub status: BaremetalSetStatus,
}

impl BaremetalSet {
    /// Creates an unbound set.
    pub fn new(name: impl Into<String>, spec: BaremetalSetSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            status: BaremetalSetStatus::default(),
        }
    }

    /// Replaces the bound hosts.
    pub fn with_bound_hosts<I, H>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HostRef>,
    {
        self.status.bound_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Same set with a different desired count.
    pub fn with_desired_count(mut self, count: u32) -> Self {
        self.spec.desired_count = count;
        self
    }

    /// Number of hosts currently bound.
    pub fn bound_count(&self) -> usize {
        self.status.bound_hosts.len()
    }

    /// The same set as it looks before any host was requested or bound.
    pub(crate) fn unbound(&self) -> Self {
        Self {
            name: self.name.clone(),
            spec: self.spec.clone(),
            status: BaremetalSetStatus::default(),
        }
        .with_desired_count(0)
    }
}

impl BaremetalSetSpec {
    pub fn new(desired_count: u32, host_namespace: Namespace) -> Self {
        Self {
            desired_count,
            host_namespace,
            label_selector: LabelSelector::default(),
            hardware_requirements: HardwareRequirements::default(),
        }
    }

    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.label_selector = selector;
        self
    }

    pub fn with_requirements(mut self, requirements: HardwareRequirements) -> Self {
        self.hardware_requirements = requirements;
        self
    }
}

// =============================================================================
// Candidate hosts
// =============================================================================

/// Availability of a host as reported by the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Provisionable and not claimed by anyone.
    Available,
    /// Already consumed by the set under evaluation.
    InUseByThisSet,
    /// Consumed by some other set or workload.
    InUseByOther,
    /// The inventory cannot currently vouch for the host.
    Unknown,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Availability::Available => "available",
            Availability::InUseByThisSet => "in_use_by_this_set",
            Availability::InUseByOther => "in_use_by_other",
            Availability::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// An inventory record for one physical host. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateHost {
    pub id: HostRef,
    pub namespace: Namespace,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Observed hardware values keyed by requirement name.
    #[serde(default)]
    pub hardware: BTreeMap<String, u64>,
    pub availability: Availability,
}

impl CandidateHost {
    /// An available host with no labels and an empty hardware profile.
    pub fn new(id: impl Into<HostRef>, namespace: Namespace) -> Self {
        Self {
            id: id.into(),
            namespace,
            labels: BTreeMap::new(),
            hardware: BTreeMap::new(),
            availability: Availability::Available,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_hardware(mut self, name: impl Into<String>, value: u64) -> Self {
        self.hardware.insert(name.into(), value);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}

// =============================================================================
// Selection fingerprint
// =============================================================================

/// Stable hash over a spec's canonical selection criteria.
///
/// Carried in admission events so operators can tell whether the selector
/// or hardware requirements moved between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionFingerprint(String);

impl SelectionFingerprint {
    pub fn of(spec: &BaremetalSetSpec) -> Self {
        let mut hasher = Sha256::new();
        for (key, value) in spec.label_selector.iter() {
            hasher.update(b"label:");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }
        for req in spec.hardware_requirements.canonical() {
            hasher.update(b"hw:");
            hasher.update(req.name.as_bytes());
            hasher.update(if req.exact_match { b"==" } else { b">=" });
            hasher.update(req.min.to_be_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        Self(format!("sha256:{}", hex::encode(&digest[..16])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SelectionFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::parse("metal3").unwrap()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let host = CandidateHost::new("h1", ns()).with_label("rack", "a");
        assert!(LabelSelector::new().matches(&host.labels));
        assert!(LabelSelector::new().matches(&BTreeMap::new()));
    }

    #[test]
    fn test_selector_is_a_conjunction() {
        let selector = LabelSelector::new().with("rack", "a").with("role", "compute");
        let both = CandidateHost::new("h1", ns())
            .with_label("rack", "a")
            .with_label("role", "compute")
            .with_label("extra", "x");
        let one = CandidateHost::new("h2", ns()).with_label("rack", "a");
        let wrong = CandidateHost::new("h3", ns())
            .with_label("rack", "b")
            .with_label("role", "compute");

        assert!(selector.matches(&both.labels));
        assert!(!selector.matches(&one.labels));
        assert!(!selector.matches(&wrong.labels));
    }

    #[test]
    fn test_selector_equality_ignores_insertion_order() {
        let a: LabelSelector = [("x", "1"), ("y", "2")].into_iter().collect();
        let b = LabelSelector::new().with("y", "2").with("x", "1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_requirement_threshold_and_exact() {
        let at_least = HardwareRequirement::at_least("cpu_count", 8);
        assert!(at_least.is_met_by(Some(8)));
        assert!(at_least.is_met_by(Some(64)));
        assert!(!at_least.is_met_by(Some(4)));
        assert!(!at_least.is_met_by(None));

        let exact = HardwareRequirement::exactly("cpu_count", 8);
        assert!(exact.is_met_by(Some(8)));
        assert!(!exact.is_met_by(Some(16)));
    }

    #[test]
    fn test_canonical_requirements_sorted() {
        let reqs = HardwareRequirements::new(vec![
            HardwareRequirement::at_least("memory_gb", 64),
            HardwareRequirement::at_least("cpu_count", 8),
        ]);
        let canonical = reqs.canonical();
        assert_eq!(canonical[0].name, "cpu_count");
        assert_eq!(canonical[1].name, "memory_gb");
    }

    #[test]
    fn test_fingerprint_ignores_requirement_order() {
        let a = BaremetalSetSpec::new(1, ns()).with_requirements(HardwareRequirements::new(vec![
            HardwareRequirement::at_least("memory_gb", 64),
            HardwareRequirement::at_least("cpu_count", 8),
        ]));
        let b = BaremetalSetSpec::new(3, ns()).with_requirements(HardwareRequirements::new(vec![
            HardwareRequirement::at_least("cpu_count", 8),
            HardwareRequirement::at_least("memory_gb", 64),
        ]));
        assert_eq!(SelectionFingerprint::of(&a), SelectionFingerprint::of(&b));
        assert!(SelectionFingerprint::of(&a).as_str().starts_with("sha256:"));
    }

    #[test]
    fn test_fingerprint_changes_with_selector() {
        let a = BaremetalSetSpec::new(1, ns());
        let b = a.clone().with_selector(LabelSelector::new().with("rack", "a"));
        assert_ne!(SelectionFingerprint::of(&a), SelectionFingerprint::of(&b));
    }

    #[test]
    fn test_set_json_shape() {
        let json = serde_json::json!({
            "name": "compute",
            "spec": {
                "desiredCount": 2,
                "hostNamespace": "metal3",
                "labelSelector": {"role": "compute"},
                "hardwareRequirements": [
                    {"name": "cpu_count", "min": 8},
                    {"name": "disk_gb", "min": 500, "exactMatch": true}
                ]
            },
            "status": {"boundHosts": ["bmh-0"]}
        });
        let set: BaremetalSet = serde_json::from_value(json).unwrap();
        assert_eq!(set.spec.desired_count, 2);
        assert_eq!(set.bound_count(), 1);
        assert!(set.spec.hardware_requirements.canonical()[1].exact_match);
    }

    #[test]
    fn test_set_json_status_optional() {
        let json = serde_json::json!({
            "name": "compute",
            "spec": {"desiredCount": 0, "hostNamespace": "metal3"}
        });
        let set: BaremetalSet = serde_json::from_value(json).unwrap();
        assert_eq!(set.bound_count(), 0);
        assert!(set.spec.label_selector.is_empty());
    }
}
