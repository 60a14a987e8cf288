//! Error types for the reservation ledger

use crate::types::{ListingId, ReservationStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reservation ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced listing does not exist
    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    /// Referenced customer does not exist
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Referenced reservation does not exist
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Referenced payment order does not exist
    #[error("Payment order not found: {0}")]
    PaymentOrderNotFound(String),

    /// Requested headcount can never fit the listing's daily capacity
    #[error("Headcount {requested} exceeds daily capacity {daily_capacity}")]
    BusinessRuleViolation {
        /// Listing's daily headcount limit
        daily_capacity: u32,
        /// Headcount requested for the reservation
        requested: u32,
    },

    /// One or more dates in range lack sufficient remaining capacity
    #[error("Dates unavailable: {dates:?}")]
    DateUnavailable {
        /// Every infeasible date in the requested range
        dates: Vec<NaiveDate>,
    },

    /// Deletion attempted on a reservation whose stay has not elapsed
    #[error("Reservation not finalized: {0}")]
    ReservationNotFinalized(String),

    /// A ledger increment would overshoot capacity despite the caller's
    /// check. Indicates a concurrency bug or bypassed check; never clamped.
    #[error(
        "Capacity exceeded for listing {listing_id} on {date}: \
         {reserved} reserved + {requested} requested > {daily_capacity}"
    )]
    CapacityExceeded {
        /// Listing whose invariant would break
        listing_id: ListingId,
        /// Date of the offending record
        date: NaiveDate,
        /// Headcount already committed
        reserved: u32,
        /// Increment that was attempted
        requested: u32,
        /// Listing's daily headcount limit
        daily_capacity: u32,
    },

    /// `start_date` is after `end_date`
    #[error("Invalid date range: {start} > {end}")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// Transition attempted from a status that does not allow it
    #[error("Invalid transition from status {from}")]
    InvalidTransition {
        /// Status the reservation is currently in
        from: ReservationStatus,
    },

    /// Payment order does not reference the reservation being confirmed
    #[error("Payment order {order_id} does not belong to reservation {reservation_id}")]
    PaymentOrderMismatch {
        /// Payment order supplied by the caller
        order_id: uuid::Uuid,
        /// Reservation being confirmed
        reservation_id: uuid::Uuid,
    },

    /// Payment gateway failure (infrastructure, retryable)
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// Infrastructure errors leave business state unchanged and may be
    /// retried by the caller; business-rule errors must not be.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::Gateway(_)
                | Error::Storage(_)
                | Error::Serialization(_)
                | Error::Concurrency(_)
                | Error::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_classification() {
        assert!(Error::Gateway("timeout".into()).is_infrastructure());
        assert!(Error::Storage("closed".into()).is_infrastructure());
        assert!(!Error::DateUnavailable { dates: vec![] }.is_infrastructure());
        assert!(!Error::BusinessRuleViolation {
            daily_capacity: 4,
            requested: 6
        }
        .is_infrastructure());
    }
}
