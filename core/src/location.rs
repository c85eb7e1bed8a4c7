use chrono::{DateTime, Duration, Utc};
use log::warn;

use crate::models::GpsFix;

/// A position fix and the moment the device produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedFix {
    pub fix: GpsFix,
    pub acquired_at: DateTime<Utc>,
}

impl CachedFix {
    pub fn new(fix: GpsFix, acquired_at: DateTime<Utc>) -> Self {
        Self { fix, acquired_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.acquired_at
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let age = self.age(now);
        age >= Duration::zero() && age <= max_age
    }
}

/// Device positioning. Returns `None` when no fix is available
/// (permission denied, no signal).
pub trait LocationProvider {
    fn current_fix(&mut self) -> Option<CachedFix>;
}

/// Provider answering with a preset fix, or none.
#[derive(Clone, Debug, Default)]
pub struct FixedLocation(pub Option<CachedFix>);

impl LocationProvider for FixedLocation {
    fn current_fix(&mut self) -> Option<CachedFix> {
        self.0.clone()
    }
}

/// One-shot fetch: accept the provider's fix only within `max_age` of `now`.
pub fn acquire_fix<L: LocationProvider + ?Sized>(
    provider: &mut L,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Option<GpsFix> {
    let cached = provider.current_fix()?;
    if cached.is_fresh(now, max_age) {
        Some(cached.fix.rounded())
    } else {
        warn!(
            "discarding GPS fix acquired {}s ago",
            cached.age(now).num_seconds()
        );
        None
    }
}
