//! AutoSouq storefront data layer.
//!
//! Local persistence (a flat key-value cache and an embedded `SQLite` store
//! kept in step by [`sync::DualStore`]), the remote catalog join
//! ([`catalog::CatalogFetcher`]), and the services built on top of them.
//!
//! # Modules
//!
//! - [`cache`] - key-value store, flat record arrays, session record
//! - [`db`] - embedded `SQLite` store and hosted `PostgreSQL` catalog queries
//! - [`sync`] - dual-store synchronizer
//! - [`catalog`] - listings joined with seller profiles
//! - [`search`] - browse filters
//! - [`seed`] - sample sellers and listings
//! - [`services`] - authentication and listing management
//! - [`state`] - [`state::AppState`] wiring it together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod search;
pub mod seed;
pub mod services;
pub mod state;
pub mod sync;
