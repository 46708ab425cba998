//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - registration, password login, session record, profile edits
//! - `listings` - create, browse and look up listings on the local stores
//!
//! Services borrow the [`DualStore`](crate::sync::DualStore) and
//! [`SessionStore`](crate::cache::SessionStore) from
//! [`AppState`](crate::state::AppState) for the duration of a call.

pub mod auth;
pub mod listings;

pub use auth::{AuthError, AuthService, ProfileChanges, Registration};
pub use listings::{ListingError, ListingService, NewListing};
