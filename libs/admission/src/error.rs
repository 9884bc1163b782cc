//! Admission error types.

use bmset_id::{HostRef, NameError};
use thiserror::Error;

use crate::immutability::SelectionField;
use crate::inventory::InventoryError;

/// Reasons an admission request is rejected.
///
/// Every variant carries enough context to form an actionable message. None
/// of them are retried inside this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The set name is not a valid RFC 1123 hostname.
    #[error("invalid value {value:?} for field {field}: {source}")]
    NameSyntax {
        field: &'static str,
        value: String,
        #[source]
        source: NameError,
    },

    /// The inventory could not be queried.
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(#[from] InventoryError),

    /// Bound hosts vanished from the inventory or became unreachable.
    #[error(
        "bound hosts [{}] of set {set} were not found in the inventory; restore them before changing the host count",
        join(.missing)
    )]
    ReferenceIntegrity { set: String, missing: Vec<HostRef> },

    /// Not enough available, matching, unbound hosts for a scale-up.
    #[error(
        "unable to find {required} additional hosts ({in_use} in use, {available} available)"
    )]
    InsufficientCandidates {
        available: usize,
        required: usize,
        in_use: usize,
    },

    /// Selection criteria changed while hosts are bound.
    #[error(
        "cannot change {} while {bound} hosts are bound",
        join(.fields)
    )]
    ImmutableSelection {
        bound: usize,
        fields: Vec<SelectionField>,
    },
}

impl AdmissionError {
    /// Only inventory outages may succeed on a later identical request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::InventoryUnavailable(_))
    }

    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::NameSyntax { .. } => "name_syntax",
            AdmissionError::InventoryUnavailable(_) => "inventory_unavailable",
            AdmissionError::ReferenceIntegrity { .. } => "reference_integrity",
            AdmissionError::InsufficientCandidates { .. } => "insufficient_candidates",
            AdmissionError::ImmutableSelection { .. } => "immutable_selection",
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
