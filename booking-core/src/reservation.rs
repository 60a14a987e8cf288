//! Reservation state machine
//!
//! Lifecycle: PENDING → PAID → CLOSED, or → CANCELLED.
//!
//! Creating a reservation commits no capacity; only the confirm transition
//! touches the occupancy ledger. All functions here run on the single
//! writer task, so a confirm's re-check-then-commit sequence can never
//! interleave with another confirm for the same listing.

use crate::{
    availability::check_range,
    error::{Error, Result},
    storage::Storage,
    types::{Listing, NewReservation, PaymentOrderId, Reservation, ReservationId, ReservationStatus},
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Current calendar date (UTC)
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Create a reservation in PENDING.
///
/// Availability is validated against the current ledger state, but no
/// capacity is committed: an abandoned checkout must not hold capacity
/// hostage. The conflict, if any, resurfaces at confirmation.
pub fn create(storage: &Storage, listing: &Listing, request: NewReservation) -> Result<Reservation> {
    let availability = check_range(
        storage,
        listing,
        request.start_date,
        request.end_date,
        request.headcount,
    )?;

    if !availability.available {
        return Err(Error::DateUnavailable {
            dates: availability.conflicting_dates,
        });
    }

    let now = Utc::now();
    let reservation = Reservation {
        id: Uuid::now_v7(),
        listing_id: request.listing_id,
        customer_id: request.customer_id,
        start_date: request.start_date,
        end_date: request.end_date,
        start_time: request.start_time,
        headcount: request.headcount,
        status: ReservationStatus::Pending,
        total_value: request.total_value,
        currency: request.currency,
        payment_order_id: None,
        created_at: now,
        updated_at: now,
    };

    storage.put_reservation_atomic(&reservation)?;

    tracing::info!(
        reservation_id = %reservation.id,
        listing_id = %listing.id,
        start = %reservation.start_date,
        end = %reservation.end_date,
        headcount = reservation.headcount,
        "Reservation created"
    );

    Ok(reservation)
}

/// Confirm a PENDING reservation after a successful gateway charge.
///
/// Availability is re-checked: other reservations may have confirmed since
/// creation. If the range still fits, every per-date increment and the PAID
/// flip commit as one atomic batch. If not, the reservation flips to
/// CANCELLED and the conflict is surfaced so the caller can tell the
/// customer that payment succeeded but the stay could not be honored.
pub fn confirm(
    storage: &Storage,
    reservation_id: ReservationId,
    payment_order_id: PaymentOrderId,
    listing: &Listing,
) -> Result<Reservation> {
    let mut reservation = storage.get_reservation(reservation_id)?;
    let order = storage.get_payment_order(payment_order_id)?;

    if order.reservation_id != reservation.id {
        return Err(Error::PaymentOrderMismatch {
            order_id: order.id,
            reservation_id: reservation.id,
        });
    }

    if reservation.status != ReservationStatus::Pending {
        return Err(Error::InvalidTransition {
            from: reservation.status,
        });
    }

    let availability = check_range(
        storage,
        listing,
        reservation.start_date,
        reservation.end_date,
        reservation.headcount,
    )?;

    if !availability.available {
        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = Utc::now();
        storage.put_reservation_atomic(&reservation)?;

        tracing::warn!(
            reservation_id = %reservation.id,
            listing_id = %listing.id,
            conflicting = ?availability.conflicting_dates,
            "Confirmation conflict; reservation cancelled"
        );

        return Err(Error::DateUnavailable {
            dates: availability.conflicting_dates,
        });
    }

    reservation.status = ReservationStatus::Paid;
    reservation.payment_order_id = Some(order.id);
    reservation.updated_at = Utc::now();

    storage.commit_confirmation(&reservation, listing.daily_capacity)?;

    tracing::info!(
        reservation_id = %reservation.id,
        listing_id = %listing.id,
        order_id = %order.id,
        "Reservation confirmed"
    );

    Ok(reservation)
}

/// Rewrite PAID to CLOSED once the stay has elapsed.
///
/// Read-time side effect, applied by every read path before a reservation
/// is returned, so no query path observes a stale status.
pub fn close_if_elapsed(
    storage: &Storage,
    reservation: &mut Reservation,
    today: NaiveDate,
) -> Result<bool> {
    if reservation.status == ReservationStatus::Paid && reservation.end_date < today {
        reservation.status = ReservationStatus::Closed;
        reservation.updated_at = Utc::now();
        storage.put_reservation_atomic(reservation)?;

        tracing::debug!(reservation_id = %reservation.id, "Reservation closed");

        return Ok(true);
    }
    Ok(false)
}

/// Delete a reservation whose stay has elapsed.
///
/// A reservation with `end_date` in the future is still open and cannot be
/// deleted, whatever its status. No ledger rollback happens here: PENDING
/// and CANCELLED never committed, and an elapsed PAID stay's occupancy rows
/// are the retention sweeper's to reclaim.
pub fn delete(storage: &Storage, reservation_id: ReservationId, today: NaiveDate) -> Result<Reservation> {
    let reservation = storage.get_reservation(reservation_id)?;

    if reservation.end_date > today {
        return Err(Error::ReservationNotFinalized(format!(
            "Reservation {} ends {} and cannot be deleted before its stay elapses",
            reservation.id, reservation.end_date
        )));
    }

    storage.delete_reservation_atomic(&reservation)?;

    tracing::info!(reservation_id = %reservation.id, "Reservation deleted");

    Ok(reservation)
}
