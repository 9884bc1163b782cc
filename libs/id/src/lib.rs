//! # bmset-id
//!
//! Identifier and name types shared by the bmset crates.
//!
//! ## Design Principles
//!
//! - Host references are opaque: they are stored and compared as values and
//!   never derived from host labels
//! - Set and namespace names follow RFC 1123 hostname syntax
//! - Request and event IDs are ULID-based and carry a type prefix
//!
//! ## ID Format
//!
//! Generated IDs use a prefixed format: `{prefix}_{ulid}`
//!
//! Examples:
//! - `req_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `evt_01HV4Z3MXNKPQR9HSTZ7WCLD4E`

mod error;
mod name;
mod types;

pub use error::{IdError, NameError};
pub use name::{is_valid_label_name, validate_label_name, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
