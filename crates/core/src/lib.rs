//! AutoSouq Core - Shared types library.
//!
//! This crate provides the domain types used across all AutoSouq components:
//! - `storefront` - Local stores, remote catalog and services
//! - `cli` - Command-line front-end
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, price, sync status and the account/listing records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
