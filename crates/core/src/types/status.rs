//! Storage outcome status.

use serde::{Deserialize, Serialize};

/// Which local stores a read was served from, or a write landed in.
///
/// Every operation of the dual-store synchronizer reports one of these so
/// callers can tell a degraded result apart from full success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Both the embedded store and the flat cache agree.
    Synced,
    /// Only the flat cache could be used; the embedded store failed or is
    /// unavailable.
    CachedOnly,
    /// The embedded store was used but the flat cache could not be updated.
    EmbeddedOnly,
    /// Neither store could be used.
    Failed,
}

impl SyncStatus {
    /// Whether the data is held by at least one store.
    #[must_use]
    pub const fn is_durable(self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Whether anything short of full synchronization happened.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        !matches!(self, Self::Synced)
    }

    /// Status from per-store success flags.
    #[must_use]
    pub const fn from_parts(cache_ok: bool, embedded_ok: bool) -> Self {
        match (cache_ok, embedded_ok) {
            (true, true) => Self::Synced,
            (true, false) => Self::CachedOnly,
            (false, true) => Self::EmbeddedOnly,
            (false, false) => Self::Failed,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synced => write!(f, "synced"),
            Self::CachedOnly => write!(f, "cached_only"),
            Self::EmbeddedOnly => write!(f, "embedded_only"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A best-effort read result tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome<T> {
    /// The value served (empty or `None` when nothing could be read).
    pub value: T,
    /// Which stores contributed.
    pub status: SyncStatus,
}

impl<T> SyncOutcome<T> {
    /// Wrap a value with its status.
    #[must_use]
    pub const fn new(value: T, status: SyncStatus) -> Self {
        Self { value, status }
    }

    /// Discard the status.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transform the value, keeping the status.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SyncOutcome<U> {
        SyncOutcome {
            value: f(self.value),
            status: self.status,
        }
    }
}

impl<T: Default> SyncOutcome<T> {
    /// The empty result both stores failed to produce.
    #[must_use]
    pub fn failed() -> Self {
        Self::new(T::default(), SyncStatus::Failed)
    }
}
