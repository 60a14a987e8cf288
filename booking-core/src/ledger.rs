//! Main reservation ledger orchestration layer
//!
//! This module ties together storage, the availability checker, the
//! reservation state machine, and the collaborator seams into a high-level
//! API for booking traffic.
//!
//! # Example
//!
//! ```no_run
//! use booking_core::{Config, InMemoryCatalog, InMemoryDirectory, ReservationLedger};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> booking_core::Result<()> {
//!     let config = Config::default();
//!     let catalog = Arc::new(InMemoryCatalog::new());
//!     let customers = Arc::new(InMemoryDirectory::new());
//!
//!     let ledger = ReservationLedger::open(config, catalog, customers).await?;
//!
//!     // let reservation = ledger.create_reservation(...).await?;
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_booking_actor, BookingHandle},
    availability::RangeAvailability,
    catalog::{CustomerDirectory, ListingCatalog},
    gateway::{ChargeRequest, PaymentGateway},
    metrics::Metrics,
    retention::RetentionSweeper,
    storage::StorageStats,
    types::{
        Listing, ListingId, NewReservation, Page, PageRequest, PaymentOrder, PaymentOrderId,
        PaymentRequest, Reservation, ReservationId,
    },
    Config, Error, Result, Storage,
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Main reservation ledger interface
pub struct ReservationLedger {
    /// Actor handle for serialized operations
    handle: BookingHandle,

    /// Direct storage access (for stats)
    storage: Arc<Storage>,

    /// Listing lookup (catalog collaborator)
    catalog: Arc<dyn ListingCatalog>,

    /// Customer lookup (user collaborator)
    customers: Arc<dyn CustomerDirectory>,

    /// Payment gateway (if configured)
    gateway: Option<Arc<dyn PaymentGateway>>,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl ReservationLedger {
    /// Open ledger with configuration and collaborators
    pub async fn open(
        config: Config,
        catalog: Arc<dyn ListingCatalog>,
        customers: Arc<dyn CustomerDirectory>,
    ) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let handle = spawn_booking_actor(storage.clone());

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            handle,
            storage,
            catalog,
            customers,
            gateway: None,
            metrics,
            config,
        })
    }

    /// Set payment gateway
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    fn listing(&self, listing_id: &ListingId) -> Result<Listing> {
        self.catalog
            .get(listing_id)
            .ok_or_else(|| Error::ListingNotFound(listing_id.to_string()))
    }

    /// Create a reservation in PENDING.
    ///
    /// Validates the customer and listing against their collaborators and
    /// the range against the current ledger state. Commits no capacity.
    pub async fn create_reservation(&self, request: NewReservation) -> Result<Reservation> {
        if !self.customers.exists(&request.customer_id) {
            return Err(Error::CustomerNotFound(request.customer_id.to_string()));
        }
        let listing = self.listing(&request.listing_id)?;

        let result = self.handle.create_reservation(listing, request).await;

        match &result {
            Ok(_) => self.metrics.record_created(),
            Err(Error::DateUnavailable { .. }) => self.metrics.record_conflict(),
            Err(_) => {}
        }

        result
    }

    /// Check whether a range fits a listing at the given headcount
    pub async fn check_availability(
        &self,
        listing_id: ListingId,
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
    ) -> Result<RangeAvailability> {
        let listing = self.listing(&listing_id)?;
        self.handle.check_range(listing, start, end, headcount).await
    }

    /// Filter candidate listings to those fully available for the range
    pub async fn filter_available_listings(
        &self,
        candidates: &[ListingId],
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
    ) -> Result<Vec<ListingId>> {
        let listings = candidates
            .iter()
            .map(|id| self.listing(id))
            .collect::<Result<Vec<_>>>()?;

        self.handle
            .filter_available(listings, start, end, headcount)
            .await
    }

    /// Charge a reservation through the payment gateway and record the
    /// resulting payment order.
    ///
    /// A gateway failure propagates as an infrastructure error and records
    /// nothing; the reservation stays PENDING and the charge can be retried.
    pub async fn charge_payment(&self, request: PaymentRequest) -> Result<PaymentOrder> {
        // Existence check before touching the gateway
        let reservation = self.handle.get_reservation(request.reservation_id).await?;

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| Error::Gateway("No payment gateway configured".to_string()))?;

        let transaction_id = gateway.charge(&ChargeRequest {
            amount: request.amount,
            currency: request.currency,
            description: request.description.clone(),
            token: request.token.clone(),
        })?;

        let order = PaymentOrder {
            id: Uuid::now_v7(),
            reservation_id: reservation.id,
            transaction_id,
            amount: request.amount,
            currency: request.currency,
            description: request.description,
            created_at: Utc::now(),
        };

        self.handle.record_payment_order(order.clone()).await?;

        Ok(order)
    }

    /// Confirm a PENDING reservation against a recorded payment order.
    ///
    /// Re-validates availability and either commits the occupancy
    /// increments (PAID) or cancels the reservation and surfaces the
    /// conflicting dates.
    pub async fn confirm_payment(
        &self,
        reservation_id: ReservationId,
        payment_order_id: PaymentOrderId,
    ) -> Result<Reservation> {
        let reservation = self.handle.get_reservation(reservation_id).await?;
        let listing = self.listing(&reservation.listing_id)?;

        let started = Instant::now();
        let result = self
            .handle
            .confirm_payment(reservation_id, payment_order_id, listing)
            .await;

        match &result {
            Ok(_) => self
                .metrics
                .record_confirmed(started.elapsed().as_secs_f64()),
            Err(Error::DateUnavailable { .. }) => self.metrics.record_cancelled(),
            Err(_) => {}
        }

        result
    }

    /// Get a reservation by id
    pub async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.handle.get_reservation(reservation_id).await
    }

    /// List reservations, paginated
    pub async fn list_reservations(&self, page: PageRequest) -> Result<Page<Reservation>> {
        self.handle.list_reservations(page).await
    }

    /// List all reservations of the customer with the given email
    pub async fn list_reservations_for_customer(&self, email: &str) -> Result<Vec<Reservation>> {
        let customer_id = self
            .customers
            .find_by_email(email)
            .ok_or_else(|| Error::CustomerNotFound(email.to_string()))?;

        self.handle.list_for_customer(customer_id).await
    }

    /// Delete a reservation whose stay has elapsed
    pub async fn delete_reservation(&self, reservation_id: ReservationId) -> Result<()> {
        self.handle.delete_reservation(reservation_id).await?;
        self.metrics.record_deleted();
        Ok(())
    }

    /// Committed headcount for a (listing, date); 0 when no record exists
    pub async fn occupancy(&self, listing_id: ListingId, date: NaiveDate) -> Result<u32> {
        self.handle.occupancy(listing_id, date).await
    }

    /// Purge occupancy records older than the cutoff (retention path)
    pub async fn purge_occupancy_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let purged = self.handle.purge_before(cutoff).await?;
        self.metrics.record_purged(purged);
        Ok(purged)
    }

    /// Build the retention sweeper for this ledger
    pub fn retention_sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(
            self.handle.clone(),
            self.config.retention.clone(),
            self.metrics.clone(),
        )
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.get_stats()
    }

    /// Metrics collector (for exposition by the outer service layer)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
