//! Cache types for catalog results.

use std::sync::Arc;

use autosouq_core::ListingId;

use super::ListingView;

/// Cache key for joined catalog results.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Recent { limit: Option<u32> },
    Listing(ListingId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Listings(Arc<Vec<ListingView>>),
    Listing(Box<ListingView>),
}
