//! Optional metrics instrumentation.
//!
//! When the `observe` feature is enabled, event processing emits counters
//! and histograms via the [`metrics`] crate. A downstream application must
//! install a metrics recorder (e.g. `metrics-exporter-prometheus`) to
//! collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record an event applied to the projection.
///
/// - `betboard.events.applied_total` – counter with `event` label
/// - `betboard.events.apply_duration_seconds` – histogram
#[inline]
pub fn record_event_applied(event: &'static str, duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("betboard.events.applied_total", "event" => event).increment(1);
        metrics::histogram!("betboard.events.apply_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (event, duration);
    }
}

/// Record a failed event.
///
/// - `betboard.events.failed_total` – counter with `kind` label
#[inline]
pub fn record_event_failed(kind: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("betboard.events.failed_total", "kind" => kind).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = kind;
    }
}

/// Record an event moved to the dead-letter queue.
///
/// - `betboard.dead_letter.total` – counter with `kind` label
#[inline]
pub fn record_dead_letter(kind: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("betboard.dead_letter.total", "kind" => kind).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = kind;
    }
}

/// Record a log skipped because it was already applied.
///
/// - `betboard.events.skipped_total` – counter
#[inline]
pub fn record_event_skipped() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("betboard.events.skipped_total").increment(1);
    }
}
