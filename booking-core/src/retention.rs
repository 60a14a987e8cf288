//! Retention sweeper for the occupancy ledger
//!
//! Occupancy rows for dates far enough in the past can never be referenced
//! by an availability check again; the sweeper deletes them on a schedule
//! to bound storage growth. Purges go through the same writer as every
//! other mutation, so a sweep cannot race a confirm.

use crate::{actor::BookingHandle, config::RetentionConfig, metrics::Metrics, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};

/// Recurring occupancy purge task
pub struct RetentionSweeper {
    handle: BookingHandle,
    config: RetentionConfig,
    metrics: Metrics,
}

impl RetentionSweeper {
    /// Create a sweeper bound to a ledger handle
    pub fn new(handle: BookingHandle, config: RetentionConfig, metrics: Metrics) -> Self {
        Self {
            handle,
            config,
            metrics,
        }
    }

    /// Run one sweep: purge everything older than `today - horizon_days`.
    ///
    /// Also usable as an ad-hoc ops trigger. Idempotent: a second immediate
    /// run deletes nothing.
    pub async fn run_once(&self) -> Result<u64> {
        let cutoff = Utc::now().date_naive() - Duration::days(i64::from(self.config.horizon_days));

        let purged = self.handle.purge_before(cutoff).await?;
        self.metrics.record_purged(purged);

        if purged > 0 {
            info!(cutoff = %cutoff, purged, "Retention sweep purged occupancy records");
        }

        Ok(purged)
    }

    /// Start the recurring sweep loop
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if !self.config.enabled {
                info!("Retention sweeper disabled by config");
                return;
            }

            info!(
                horizon_days = self.config.horizon_days,
                interval_secs = self.config.sweep_interval_secs,
                "Starting retention sweeper"
            );

            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                self.config.sweep_interval_secs,
            ));

            loop {
                interval.tick().await;

                match self.run_once().await {
                    Ok(_) => {}
                    // Mailbox closed means the ledger shut down
                    Err(crate::Error::Concurrency(_)) => break,
                    Err(e) => warn!("Retention sweep failed: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_booking_actor;
    use crate::storage::Storage;
    use crate::types::{Currency, Listing, Reservation, ReservationStatus};
    use crate::Config;
    use chrono::{NaiveTime, Utc};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use uuid::Uuid;

    fn paid_stay(listing: &Listing, start_offset_days: i64, end_offset_days: i64) -> Reservation {
        let today = Utc::now().date_naive();
        Reservation {
            id: Uuid::now_v7(),
            listing_id: listing.id,
            customer_id: Uuid::now_v7(),
            start_date: today + Duration::days(start_offset_days),
            end_date: today + Duration::days(end_offset_days),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            headcount: 2,
            status: ReservationStatus::Paid,
            total_value: Decimal::new(10000, 2),
            currency: Currency::BRL,
            payment_order_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sweep_purges_only_past_horizon() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let listing = Listing::new(Uuid::now_v7(), "riverside", 4);

        // Far past (beyond the 31-day horizon), recent past, and future
        let old = paid_stay(&listing, -40, -38);
        let recent = paid_stay(&listing, -5, -4);
        let upcoming = paid_stay(&listing, 5, 6);
        for stay in [&old, &recent, &upcoming] {
            storage.commit_confirmation(stay, listing.daily_capacity).unwrap();
        }

        let handle = spawn_booking_actor(storage);
        let sweeper = RetentionSweeper::new(
            handle.clone(),
            RetentionConfig::default(),
            Metrics::new().unwrap(),
        );

        let purged = sweeper.run_once().await.unwrap();
        assert_eq!(purged, 3); // the three days of the old stay

        assert_eq!(handle.occupancy(listing.id, old.start_date).await.unwrap(), 0);
        assert_eq!(
            handle.occupancy(listing.id, recent.start_date).await.unwrap(),
            2
        );
        assert_eq!(
            handle.occupancy(listing.id, upcoming.start_date).await.unwrap(),
            2
        );

        // Second sweep is a no-op
        assert_eq!(sweeper.run_once().await.unwrap(), 0);

        handle.shutdown().await.unwrap();
    }
}
