//! Command implementations.
//!
//! - `migrate` - create the embedded and hosted schemas
//! - `seed` - load sample sellers and listings
//! - `account` - registration, login and the local profile
//! - `listings` - browse and sell on the local stores
//! - `catalog` - the hosted catalog joined with seller profiles

pub mod account;
pub mod catalog;
pub mod listings;
pub mod migrate;
pub mod seed;
