//! Hardware requirement matching.

use crate::model::{CandidateHost, HardwareRequirement, HardwareRequirements};

/// Whether `candidate` satisfies every requirement.
///
/// A profile entry that is missing counts as not satisfying. An empty
/// requirement list matches every host.
pub fn matches(candidate: &CandidateHost, requirements: &HardwareRequirements) -> bool {
    requirements
        .iter()
        .all(|req| req.is_met_by(candidate.hardware.get(&req.name).copied()))
}

/// The requirements `candidate` fails, in declaration order.
pub fn unmet<'r>(
    candidate: &CandidateHost,
    requirements: &'r HardwareRequirements,
) -> Vec<&'r HardwareRequirement> {
    requirements
        .iter()
        .filter(|req| !req.is_met_by(candidate.hardware.get(&req.name).copied()))
        .collect()
}
