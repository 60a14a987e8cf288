//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `booking_reservations_created_total` - Reservations created (PENDING)
//! - `booking_reservations_confirmed_total` - Confirmations committed (PAID)
//! - `booking_reservations_cancelled_total` - Confirmation conflicts (CANCELLED)
//! - `booking_reservations_deleted_total` - Reservations deleted
//! - `booking_date_conflicts_total` - Range checks that reported conflicts
//! - `booking_occupancy_purged_total` - Occupancy rows reclaimed by retention
//! - `booking_confirm_duration_seconds` - Confirm transition latency

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Reservations created
    pub reservations_created: IntCounter,

    /// Reservations confirmed
    pub reservations_confirmed: IntCounter,

    /// Reservations cancelled at confirmation
    pub reservations_cancelled: IntCounter,

    /// Reservations deleted
    pub reservations_deleted: IntCounter,

    /// Range checks that reported at least one conflicting date
    pub date_conflicts: IntCounter,

    /// Occupancy rows purged by the retention sweeper
    pub occupancy_purged: IntCounter,

    /// Confirm transition latency
    pub confirm_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry.
    ///
    /// Counters are registered on the local registry only, so multiple
    /// ledgers in one process (tests, embedded setups) do not collide.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let reservations_created = IntCounter::with_opts(Opts::new(
            "booking_reservations_created_total",
            "Reservations created (PENDING)",
        ))?;
        registry.register(Box::new(reservations_created.clone()))?;

        let reservations_confirmed = IntCounter::with_opts(Opts::new(
            "booking_reservations_confirmed_total",
            "Confirmations committed (PAID)",
        ))?;
        registry.register(Box::new(reservations_confirmed.clone()))?;

        let reservations_cancelled = IntCounter::with_opts(Opts::new(
            "booking_reservations_cancelled_total",
            "Confirmation conflicts (CANCELLED)",
        ))?;
        registry.register(Box::new(reservations_cancelled.clone()))?;

        let reservations_deleted = IntCounter::with_opts(Opts::new(
            "booking_reservations_deleted_total",
            "Reservations deleted",
        ))?;
        registry.register(Box::new(reservations_deleted.clone()))?;

        let date_conflicts = IntCounter::with_opts(Opts::new(
            "booking_date_conflicts_total",
            "Range checks that reported conflicts",
        ))?;
        registry.register(Box::new(date_conflicts.clone()))?;

        let occupancy_purged = IntCounter::with_opts(Opts::new(
            "booking_occupancy_purged_total",
            "Occupancy rows reclaimed by retention",
        ))?;
        registry.register(Box::new(occupancy_purged.clone()))?;

        let confirm_duration = Histogram::with_opts(
            HistogramOpts::new(
                "booking_confirm_duration_seconds",
                "Confirm transition latency",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(confirm_duration.clone()))?;

        Ok(Self {
            reservations_created,
            reservations_confirmed,
            reservations_cancelled,
            reservations_deleted,
            date_conflicts,
            occupancy_purged,
            confirm_duration,
            registry,
        })
    }

    /// Record a created reservation
    pub fn record_created(&self) {
        self.reservations_created.inc();
    }

    /// Record a confirmed reservation
    pub fn record_confirmed(&self, duration_seconds: f64) {
        self.reservations_confirmed.inc();
        self.confirm_duration.observe(duration_seconds);
    }

    /// Record a confirmation conflict
    pub fn record_cancelled(&self) {
        self.reservations_cancelled.inc();
        self.date_conflicts.inc();
    }

    /// Record a deleted reservation
    pub fn record_deleted(&self) {
        self.reservations_deleted.inc();
    }

    /// Record a creation-time conflict
    pub fn record_conflict(&self) {
        self.date_conflicts.inc();
    }

    /// Record a retention sweep
    pub fn record_purged(&self, count: u64) {
        self.occupancy_purged.inc_by(count);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
