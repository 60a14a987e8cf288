//! Actor-based concurrency for the reservation ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one logical writer task owns every ledger mutation, so a confirm's
//! re-check-then-commit sequence is totally ordered against every other
//! confirm and two overlapping confirmations can never both observe the
//! same free capacity. Read paths also run here because reads carry a
//! write-time side effect (lazy PAID → CLOSED).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Request workers / retention sweeper          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ BookingHandle (Clone)
//!                       ▼
//!              mpsc::channel (bounded)
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             BookingActor (single task)                │
//! │   check range → commit WriteBatch → reply oneshot     │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    availability::{self, RangeAvailability},
    error::{Error, Result},
    reservation,
    storage::Storage,
    types::{
        CustomerId, Listing, ListingId, NewReservation, Page, PageRequest, PaymentOrder,
        PaymentOrderId, Reservation, ReservationId,
    },
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the booking actor
pub enum BookingMessage {
    /// Create a PENDING reservation
    CreateReservation {
        listing: Listing,
        request: NewReservation,
        response: oneshot::Sender<Result<Reservation>>,
    },

    /// Confirm a PENDING reservation (re-check + atomic commit)
    ConfirmPayment {
        reservation_id: ReservationId,
        payment_order_id: PaymentOrderId,
        listing: Listing,
        response: oneshot::Sender<Result<Reservation>>,
    },

    /// Record a gateway charge
    RecordPaymentOrder {
        order: PaymentOrder,
        response: oneshot::Sender<Result<()>>,
    },

    /// Get a reservation (applies lazy close)
    GetReservation {
        reservation_id: ReservationId,
        response: oneshot::Sender<Result<Reservation>>,
    },

    /// List reservations, paginated (applies lazy close)
    ListReservations {
        page: PageRequest,
        response: oneshot::Sender<Result<Page<Reservation>>>,
    },

    /// List a customer's reservations (applies lazy close)
    ListForCustomer {
        customer_id: CustomerId,
        response: oneshot::Sender<Result<Vec<Reservation>>>,
    },

    /// Delete an elapsed reservation
    DeleteReservation {
        reservation_id: ReservationId,
        response: oneshot::Sender<Result<Reservation>>,
    },

    /// Check availability for a range (pure read)
    CheckRange {
        listing: Listing,
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
        response: oneshot::Sender<Result<RangeAvailability>>,
    },

    /// Filter candidate listings to the fully-available ones (pure read)
    FilterAvailable {
        candidates: Vec<Listing>,
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
        response: oneshot::Sender<Result<Vec<ListingId>>>,
    },

    /// Committed headcount for a (listing, date)
    GetOccupancy {
        listing_id: ListingId,
        date: NaiveDate,
        response: oneshot::Sender<Result<u32>>,
    },

    /// Purge occupancy records older than the cutoff
    PurgeBefore {
        cutoff: NaiveDate,
        response: oneshot::Sender<Result<u64>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes booking messages
pub struct BookingActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<BookingMessage>,
}

impl BookingActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<BookingMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                BookingMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
        tracing::debug!("Booking actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: BookingMessage) {
        match msg {
            BookingMessage::CreateReservation {
                listing,
                request,
                response,
            } => {
                let result = reservation::create(&self.storage, &listing, request);
                let _ = response.send(result);
            }

            BookingMessage::ConfirmPayment {
                reservation_id,
                payment_order_id,
                listing,
                response,
            } => {
                let result =
                    reservation::confirm(&self.storage, reservation_id, payment_order_id, &listing);
                let _ = response.send(result);
            }

            BookingMessage::RecordPaymentOrder { order, response } => {
                let result = self.storage.put_payment_order(&order);
                let _ = response.send(result);
            }

            BookingMessage::GetReservation {
                reservation_id,
                response,
            } => {
                let result = self.read_reservation(reservation_id);
                let _ = response.send(result);
            }

            BookingMessage::ListReservations { page, response } => {
                let result = self.list_reservations(page);
                let _ = response.send(result);
            }

            BookingMessage::ListForCustomer {
                customer_id,
                response,
            } => {
                let result = self.list_for_customer(&customer_id);
                let _ = response.send(result);
            }

            BookingMessage::DeleteReservation {
                reservation_id,
                response,
            } => {
                let result =
                    reservation::delete(&self.storage, reservation_id, reservation::today());
                let _ = response.send(result);
            }

            BookingMessage::CheckRange {
                listing,
                start,
                end,
                headcount,
                response,
            } => {
                let result =
                    availability::check_range(&self.storage, &listing, start, end, headcount);
                let _ = response.send(result);
            }

            BookingMessage::FilterAvailable {
                candidates,
                start,
                end,
                headcount,
                response,
            } => {
                let result = availability::filter_available_listings(
                    &self.storage,
                    &candidates,
                    start,
                    end,
                    headcount,
                );
                let _ = response.send(result);
            }

            BookingMessage::GetOccupancy {
                listing_id,
                date,
                response,
            } => {
                let result = self.storage.reserved_count(&listing_id, date);
                let _ = response.send(result);
            }

            BookingMessage::PurgeBefore { cutoff, response } => {
                let result = self.storage.purge_occupancy_before(cutoff);
                let _ = response.send(result);
            }

            BookingMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn read_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        let mut reservation = self.storage.get_reservation(reservation_id)?;
        reservation::close_if_elapsed(&self.storage, &mut reservation, reservation::today())?;
        Ok(reservation)
    }

    fn list_reservations(&self, page: PageRequest) -> Result<Page<Reservation>> {
        if page.page_size == 0 {
            return Err(Error::Config("page_size must be >= 1".to_string()));
        }

        let (mut items, total) = self.storage.scan_reservations(page.offset(), page.page_size)?;

        let today = reservation::today();
        for reservation in &mut items {
            reservation::close_if_elapsed(&self.storage, reservation, today)?;
        }

        Ok(Page {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }

    fn list_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Reservation>> {
        let mut reservations = self.storage.reservations_for_customer(customer_id)?;

        let today = reservation::today();
        for reservation in &mut reservations {
            reservation::close_if_elapsed(&self.storage, reservation, today)?;
        }

        Ok(reservations)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct BookingHandle {
    sender: mpsc::Sender<BookingMessage>,
}

impl BookingHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<BookingMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> BookingMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a PENDING reservation
    pub async fn create_reservation(
        &self,
        listing: Listing,
        request: NewReservation,
    ) -> Result<Reservation> {
        self.request(|response| BookingMessage::CreateReservation {
            listing,
            request,
            response,
        })
        .await
    }

    /// Confirm a PENDING reservation
    pub async fn confirm_payment(
        &self,
        reservation_id: ReservationId,
        payment_order_id: PaymentOrderId,
        listing: Listing,
    ) -> Result<Reservation> {
        self.request(|response| BookingMessage::ConfirmPayment {
            reservation_id,
            payment_order_id,
            listing,
            response,
        })
        .await
    }

    /// Record a gateway charge
    pub async fn record_payment_order(&self, order: PaymentOrder) -> Result<()> {
        self.request(|response| BookingMessage::RecordPaymentOrder { order, response })
            .await
    }

    /// Get a reservation
    pub async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.request(|response| BookingMessage::GetReservation {
            reservation_id,
            response,
        })
        .await
    }

    /// List reservations, paginated
    pub async fn list_reservations(&self, page: PageRequest) -> Result<Page<Reservation>> {
        self.request(|response| BookingMessage::ListReservations { page, response })
            .await
    }

    /// List a customer's reservations
    pub async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Reservation>> {
        self.request(|response| BookingMessage::ListForCustomer {
            customer_id,
            response,
        })
        .await
    }

    /// Delete an elapsed reservation
    pub async fn delete_reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.request(|response| BookingMessage::DeleteReservation {
            reservation_id,
            response,
        })
        .await
    }

    /// Check availability for a range
    pub async fn check_range(
        &self,
        listing: Listing,
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
    ) -> Result<RangeAvailability> {
        self.request(|response| BookingMessage::CheckRange {
            listing,
            start,
            end,
            headcount,
            response,
        })
        .await
    }

    /// Filter candidate listings to the fully-available ones
    pub async fn filter_available(
        &self,
        candidates: Vec<Listing>,
        start: NaiveDate,
        end: NaiveDate,
        headcount: u32,
    ) -> Result<Vec<ListingId>> {
        self.request(|response| BookingMessage::FilterAvailable {
            candidates,
            start,
            end,
            headcount,
            response,
        })
        .await
    }

    /// Committed headcount for a (listing, date)
    pub async fn occupancy(&self, listing_id: ListingId, date: NaiveDate) -> Result<u32> {
        self.request(|response| BookingMessage::GetOccupancy {
            listing_id,
            date,
            response,
        })
        .await
    }

    /// Purge occupancy records older than the cutoff
    pub async fn purge_before(&self, cutoff: NaiveDate) -> Result<u64> {
        self.request(|response| BookingMessage::PurgeBefore { cutoff, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(BookingMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the booking actor
pub fn spawn_booking_actor(storage: Arc<Storage>) -> BookingHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = BookingActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    BookingHandle::new(tx)
}
