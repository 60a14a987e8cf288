//! Booking Core
//!
//! Availability & reservation ledger for bookable inventory: per-(listing,
//! date) occupancy tracking, range availability checks, and the reservation
//! lifecycle (PENDING → PAID → CLOSED, or → CANCELLED).
//!
//! # Architecture
//!
//! - **Single Writer**: one logical writer task serializes every ledger
//!   mutation, so confirm's re-check-then-commit can never interleave
//! - **Atomic Commits**: a confirmation's per-date increments and status
//!   flip land in one storage write batch
//! - **Lazy Close**: elapsed PAID reservations are rewritten to CLOSED at
//!   read time, on every read path
//! - **Retention**: a background sweeper purges occupancy rows for dates
//!   past the retention horizon
//!
//! # Invariants
//!
//! - Capacity: committed headcount per (listing, date) never exceeds the
//!   listing's daily capacity
//! - Creation reserves nothing: only the confirm transition mutates the
//!   occupancy ledger

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod metrics;
pub mod reservation;
pub mod retention;
pub mod storage;
pub mod types;

// Re-exports
pub use availability::RangeAvailability;
pub use catalog::{CustomerDirectory, InMemoryCatalog, InMemoryDirectory, ListingCatalog};
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{ChargeRequest, GatewayError, PaymentGateway, SandboxGateway};
pub use ledger::ReservationLedger;
pub use retention::RetentionSweeper;
pub use storage::Storage;
pub use types::{
    Currency, Listing, NewReservation, OccupancyRecord, Page, PageRequest, PaymentOrder,
    PaymentRequest, Reservation, ReservationStatus,
};
