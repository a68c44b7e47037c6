//! Periodic expiry hook shared by the in-memory services.

use async_trait::async_trait;

/// A store that can drop its expired entries on demand.
///
/// The API crate spawns one background task per implementor that calls
/// [`Sweep::sweep`] on a fixed interval.
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Short label used in log output.
    fn name(&self) -> &'static str;

    /// Remove expired entries, returning how many were removed.
    async fn sweep(&self) -> usize;
}
