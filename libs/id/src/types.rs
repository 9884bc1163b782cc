//! Typed ID and reference definitions.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::name::validate_single_label;
use crate::{IdError, NameError};

// =============================================================================
// Requests and Events
// =============================================================================

/// Split `{prefix}_{ulid}` and check the prefix.
fn parse_prefixed(s: &str, prefix: &'static str) -> Result<Ulid, IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    let (actual, ulid) = s.split_once('_').ok_or(IdError::MissingSeparator)?;
    if actual != prefix {
        return Err(IdError::InvalidPrefix {
            expected: prefix,
            actual: actual.to_string(),
        });
    }
    ulid.parse()
        .map_err(|e: ulid::DecodeError| IdError::InvalidUlid(e.to_string()))
}

/// Identifies one admission request end to end: the `x-request-id` header,
/// the tracing span and every event the request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(Ulid);

impl RequestId {
    pub const PREFIX: &'static str = "req";

    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_prefixed(s, Self::PREFIX).map(Self)
    }

    /// Reuse a caller-supplied id when it is one of ours, otherwise mint one.
    pub fn parse_or_new(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RequestId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

/// Identifies one admission event. Ordered by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(Ulid);

impl EventId {
    pub const PREFIX: &'static str = "evt";

    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_prefixed(s, Self::PREFIX).map(Self)
    }

    /// Milliseconds since the Unix epoch at which the event id was minted.
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl TryFrom<String> for EventId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.to_string()
    }
}

// =============================================================================
// Hosts
// =============================================================================

/// Opaque reference to a bare-metal host in the inventory.
///
/// Host references are recorded in a set's status when a host is bound. They
/// are compared by value only and carry no meaning beyond identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostRef(String);

impl HostRef {
    /// Creates a host reference from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HostRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Namespaces
// =============================================================================

/// Namespace scoping the hosts a set may draw from.
///
/// Always a non-empty single RFC 1123 label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Parses and validates a namespace name.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        validate_single_label(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the namespace as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Namespace {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_single_label(&s)?;
        Ok(Self(s))
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

// =============================================================================
// Tests
// =============================================================================
