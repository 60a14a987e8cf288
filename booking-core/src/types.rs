//! Core types for the reservation ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Listing identifier (catalog-owned resource)
pub type ListingId = Uuid;

/// Customer identifier (directory-owned)
pub type CustomerId = Uuid;

/// Reservation identifier
pub type ReservationId = Uuid;

/// Payment order identifier
pub type PaymentOrderId = Uuid;

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// Brazilian Real
    BRL,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::BRL => "BRL",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "BRL" => Some(Currency::BRL),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A bookable resource with a fixed daily headcount capacity.
///
/// Owned by the catalog collaborator; read-only to this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing ID
    pub id: ListingId,

    /// Display name (used in logs only)
    pub name: String,

    /// Maximum simultaneous headcount per calendar day (>= 1)
    pub daily_capacity: u32,
}

impl Listing {
    /// Create a listing handle
    pub fn new(id: ListingId, name: impl Into<String>, daily_capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            daily_capacity,
        }
    }
}

/// Per-(listing, date) committed headcount.
///
/// Created lazily the first time a date receives a committed reservation.
/// Invariant: `reserved_count <= listing.daily_capacity` after every
/// successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    /// Listing this record belongs to
    pub listing_id: ListingId,

    /// Calendar date
    pub date: NaiveDate,

    /// Headcount already committed for this date
    pub reserved_count: u32,
}

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReservationStatus {
    /// Created, awaiting payment; no capacity committed
    Pending = 1,
    /// Payment confirmed, capacity committed
    Paid = 2,
    /// Cancelled (confirmation conflict); no capacity held
    Cancelled = 3,
    /// Stay elapsed (terminal)
    Closed = 4,
}

impl ReservationStatus {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Closed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Paid => "PAID",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Closed => "CLOSED",
        };
        write!(f, "{}", s)
    }
}

/// A customer's request to occupy a listing over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID (UUIDv7 for time-ordering)
    pub id: ReservationId,

    /// Listing being reserved
    pub listing_id: ListingId,

    /// Customer who owns this reservation (plain foreign key)
    pub customer_id: CustomerId,

    /// First day of the stay
    pub start_date: NaiveDate,

    /// Last day of the stay (inclusive, `start_date <= end_date`)
    pub end_date: NaiveDate,

    /// Check-in time on the first day
    pub start_time: NaiveTime,

    /// Number of people (>= 1)
    pub headcount: u32,

    /// Lifecycle status
    pub status: ReservationStatus,

    /// Total price; opaque input, not computed here
    pub total_value: Decimal,

    /// Currency of `total_value`
    pub currency: Currency,

    /// Payment order attached at confirmation (if any)
    pub payment_order_id: Option<PaymentOrderId>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Number of calendar days covered (inclusive range)
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Input for creating a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    /// Listing to reserve
    pub listing_id: ListingId,

    /// Requesting customer
    pub customer_id: CustomerId,

    /// First day of the stay
    pub start_date: NaiveDate,

    /// Last day of the stay (inclusive)
    pub end_date: NaiveDate,

    /// Check-in time
    pub start_time: NaiveTime,

    /// Number of people
    pub headcount: u32,

    /// Total price, carried through as-is
    pub total_value: Decimal,

    /// Currency of `total_value`
    pub currency: Currency,
}

/// Input for charging a reservation through the payment gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Reservation being paid for
    pub reservation_id: ReservationId,

    /// Amount to charge
    pub amount: Decimal,

    /// Charge currency
    pub currency: Currency,

    /// Free-form description forwarded to the gateway
    pub description: String,

    /// Opaque charge token obtained by the client
    pub token: String,
}

/// Record of a successful gateway charge; one-to-one with a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Payment order ID
    pub id: PaymentOrderId,

    /// Reservation this charge pays for
    pub reservation_id: ReservationId,

    /// Transaction id returned by the external gateway
    pub transaction_id: String,

    /// Charged amount
    pub amount: Decimal,

    /// Charge currency
    pub currency: Currency,

    /// Free-form description forwarded to the gateway
    pub description: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Pagination request for enumeration queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: usize,

    /// Items per page (>= 1)
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 20,
        }
    }
}

impl PageRequest {
    /// Offset of the first item of this page
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }
}

/// One page of an enumeration query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Zero-based page index
    pub page: usize,

    /// Requested page size
    pub page_size: usize,

    /// Total items across all pages
    pub total: u64,
}

impl<T> Page<T> {
    /// Total number of pages for this page size
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("USD"), Some(Currency::USD));
        assert_eq!(Currency::parse("BRL"), Some(Currency::BRL));
        assert_eq!(Currency::parse("INVALID"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(!ReservationStatus::Paid.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::Closed.is_terminal());
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest {
            page: 3,
            page_size: 25,
        };
        assert_eq!(req.offset(), 75);
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<u32> = Page {
            items: vec![],
            page: 0,
            page_size: 20,
            total: 41,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
