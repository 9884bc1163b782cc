//! Scale admission for bare-metal sets.
//!
//! A bare-metal set owns a number of physical hosts drawn from an external
//! inventory. Every create or update of a set passes through the
//! [`Validator`], which decides whether the requested host count can be
//! satisfied without touching any state:
//!
//! 1. **Name**: the set name must be an RFC 1123 hostname.
//! 2. **Selection guard**: once hosts are bound, the label selector and the
//!    hardware requirements are frozen.
//! 3. **Reference check**: on any count change, every bound host must still
//!    exist and be reachable in the inventory.
//! 4. **Scale admission**: a scale-up needs at least `delta` available,
//!    matching, unbound hosts. Scale-downs are always admitted here.
//!
//! # Invariants
//!
//! - Decisions are deterministic given the same inputs
//! - Nothing in this crate mutates the set or the inventory
//! - Inventory outages are surfaced, never read as "zero hosts"

pub mod error;
pub mod hardware;
pub mod immutability;
pub mod inventory;
pub mod model;
pub mod notify;
pub mod references;
pub mod scale;
pub mod validator;

pub use error::AdmissionError;
pub use inventory::{Inventory, InventoryError, MemoryInventory};
pub use model::{
    Availability, BaremetalSet, BaremetalSetSpec, BaremetalSetStatus, CandidateHost,
    HardwareRequirement, HardwareRequirements, LabelSelector, SelectionFingerprint,
};
pub use notify::{EventSink, MemorySink, TracingSink};
pub use scale::{admit_scale, Admission, AdmissionResult};
pub use validator::{RequestMeta, Validator, ValidatorConfig};

pub use bmset_events::{Operation, ScaleDirection};
pub use bmset_id::{HostRef, Namespace};
