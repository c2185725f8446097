use chrono::{DateTime, Duration, Utc};

use crate::services::enricher::EnrichedActivity;

/// Default trailing window for repository feeds.
#[must_use]
pub fn default_activity_window() -> Duration {
    Duration::days(7)
}

/// Start of the window ending at `reference`, clamped to the earliest
/// representable instant.
#[must_use]
pub fn window_start(reference: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    reference
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// True when any issue or PR was updated strictly after `reference - window`.
#[must_use]
pub fn is_active(activity: &EnrichedActivity, reference: DateTime<Utc>, window: Duration) -> bool {
    let threshold = window_start(reference, window);
    activity.items().any(|item| item.updated_at > threshold)
}
