//! bmset admission webhook library.
//!
//! This crate primarily ships a `bmset-webhook` binary, but exposes its router
//! and inventory adapter so integration tests can drive them directly.

pub mod api;
pub mod config;
pub mod inventory;
pub mod state;
