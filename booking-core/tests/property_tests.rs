//! Property-based tests for reservation ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Capacity: committed headcount never exceeds daily capacity
//! - Creation reserves nothing: only confirm mutates the ledger
//! - Idempotent checks: repeated range checks agree
//! - Retention: purges remove exactly the pre-cutoff rows

use booking_core::{
    Config, Currency, InMemoryCatalog, InMemoryDirectory, Listing, NewReservation, PageRequest,
    PaymentRequest, Reservation, ReservationLedger, ReservationStatus, SandboxGateway,
};
use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

const DAILY_CAPACITY: u32 = 4;

/// Fixed base date well in the future, so lazy close never interferes
fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()
}

struct Fixture {
    ledger: Arc<ReservationLedger>,
    listing: Listing,
    customer_id: Uuid,
    _temp: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();

    let catalog = Arc::new(InMemoryCatalog::new());
    let listing = Listing::new(Uuid::now_v7(), "riverside", DAILY_CAPACITY);
    catalog.insert(listing.clone());

    let customers = Arc::new(InMemoryDirectory::new());
    let customer_id = Uuid::now_v7();
    customers.insert(customer_id, "ana@example.com");

    let ledger = ReservationLedger::open(config, catalog, customers)
        .await
        .unwrap()
        .with_gateway(Arc::new(SandboxGateway::new()));

    Fixture {
        ledger: Arc::new(ledger),
        listing,
        customer_id,
        _temp: temp_dir,
    }
}

fn request(
    fx: &Fixture,
    start: NaiveDate,
    end: NaiveDate,
    headcount: u32,
) -> NewReservation {
    NewReservation {
        listing_id: fx.listing.id,
        customer_id: fx.customer_id,
        start_date: start,
        end_date: end,
        start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        headcount,
        total_value: Decimal::new(45000, 2),
        currency: Currency::BRL,
    }
}

async fn charge_and_confirm(
    fx: &Fixture,
    reservation: &Reservation,
) -> booking_core::Result<Reservation> {
    let order = fx
        .ledger
        .charge_payment(PaymentRequest {
            reservation_id: reservation.id,
            amount: reservation.total_value,
            currency: reservation.currency,
            description: "stay".to_string(),
            token: "tok_visa".to_string(),
        })
        .await?;

    fx.ledger.confirm_payment(reservation.id, order.id).await
}

/// Strategy for booking attempts inside a 10-day window:
/// (start day offset, extra nights, headcount)
fn attempt_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    (0u32..10, 0u32..4, 1u32..=DAILY_CAPACITY)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: whatever sequence of bookings is attempted, committed
    /// headcount per date never exceeds capacity, and it always equals the
    /// sum of PAID reservations covering that date.
    #[test]
    fn prop_capacity_invariant(attempts in prop::collection::vec(attempt_strategy(), 1..12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fx = fixture().await;

            for (offset, extra, headcount) in attempts {
                let start = base_date() + Duration::days(i64::from(offset));
                let end = start + Duration::days(i64::from(extra));

                let created = match fx.ledger.create_reservation(request(&fx, start, end, headcount)).await {
                    Ok(reservation) => reservation,
                    Err(booking_core::Error::DateUnavailable { .. }) => continue,
                    Err(e) => return Err(proptest::test_runner::TestCaseError::fail(format!("create failed: {}", e))),
                };

                match charge_and_confirm(&fx, &created).await {
                    Ok(_) => {}
                    Err(booking_core::Error::DateUnavailable { .. }) => {}
                    Err(e) => return Err(proptest::test_runner::TestCaseError::fail(format!("confirm failed: {}", e))),
                }
            }

            // Paid reservations as the ground truth
            let all = fx.ledger
                .list_reservations(PageRequest { page: 0, page_size: 1000 })
                .await
                .unwrap();

            for day in 0..14i64 {
                let date = base_date() + Duration::days(day);
                let committed = fx.ledger.occupancy(fx.listing.id, date).await.unwrap();

                prop_assert!(
                    committed <= DAILY_CAPACITY,
                    "capacity overshoot on {}: {}",
                    date,
                    committed
                );

                let paid_sum: u32 = all
                    .items
                    .iter()
                    .filter(|r| {
                        r.status == ReservationStatus::Paid
                            && r.start_date <= date
                            && date <= r.end_date
                    })
                    .map(|r| r.headcount)
                    .sum();
                prop_assert_eq!(committed, paid_sum, "ledger drift on {}", date);
            }

            let ledger = Arc::try_unwrap(fx.ledger).ok().unwrap();
            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: creating reservations never touches the occupancy ledger,
    /// even when their combined headcount could never be honored.
    #[test]
    fn prop_creation_reserves_nothing(attempts in prop::collection::vec(attempt_strategy(), 1..12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fx = fixture().await;

            for (offset, extra, headcount) in attempts {
                let start = base_date() + Duration::days(i64::from(offset));
                let end = start + Duration::days(i64::from(extra));
                // Against an empty ledger every individually-valid request succeeds
                fx.ledger
                    .create_reservation(request(&fx, start, end, headcount))
                    .await
                    .unwrap();
            }

            for day in 0..14i64 {
                let date = base_date() + Duration::days(day);
                prop_assert_eq!(fx.ledger.occupancy(fx.listing.id, date).await.unwrap(), 0);
            }

            let ledger = Arc::try_unwrap(fx.ledger).ok().unwrap();
            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: with no intervening commits, repeated range checks return
    /// identical results.
    #[test]
    fn prop_check_range_idempotent(
        (offset, extra, headcount) in attempt_strategy(),
        committed_headcount in 1u32..=DAILY_CAPACITY,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fx = fixture().await;

            // Commit one stay to make the ledger non-trivial
            let created = fx.ledger
                .create_reservation(request(
                    &fx,
                    base_date(),
                    base_date() + Duration::days(3),
                    committed_headcount,
                ))
                .await
                .unwrap();
            charge_and_confirm(&fx, &created).await.unwrap();

            let start = base_date() + Duration::days(i64::from(offset));
            let end = start + Duration::days(i64::from(extra));

            let first = fx.ledger
                .check_availability(fx.listing.id, start, end, headcount)
                .await
                .unwrap();
            let second = fx.ledger
                .check_availability(fx.listing.id, start, end, headcount)
                .await
                .unwrap();
            prop_assert_eq!(&first, &second);

            let ledger = Arc::try_unwrap(fx.ledger).ok().unwrap();
            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: purging at a cutoff removes exactly the rows strictly
    /// before it and leaves the rest untouched.
    #[test]
    fn prop_purge_boundary(cutoff_offset in 0i64..14) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fx = fixture().await;

            // One confirmed stay covering the whole 10-day window
            let created = fx.ledger
                .create_reservation(request(&fx, base_date(), base_date() + Duration::days(9), 2))
                .await
                .unwrap();
            charge_and_confirm(&fx, &created).await.unwrap();

            let cutoff = base_date() + Duration::days(cutoff_offset);
            fx.ledger.purge_occupancy_before(cutoff).await.unwrap();

            for day in 0..10i64 {
                let date = base_date() + Duration::days(day);
                let committed = fx.ledger.occupancy(fx.listing.id, date).await.unwrap();
                if date < cutoff {
                    prop_assert_eq!(committed, 0, "row at {} survived purge", date);
                } else {
                    prop_assert_eq!(committed, 2, "row at {} was clobbered", date);
                }
            }

            let ledger = Arc::try_unwrap(fx.ledger).ok().unwrap();
            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}

mod integration_tests {
    use super::*;

    /// Concurrently confirming two overlapping reservations whose combined
    /// headcount exceeds capacity must yield exactly one PAID and one
    /// CANCELLED, never two PAID.
    #[tokio::test]
    async fn test_no_double_commit() {
        let fx = fixture().await;
        let start = base_date();
        let end = base_date() + Duration::days(2);

        let first = fx
            .ledger
            .create_reservation(request(&fx, start, end, 3))
            .await
            .unwrap();
        let second = fx
            .ledger
            .create_reservation(request(&fx, start, end, 3))
            .await
            .unwrap();

        let order_a = fx
            .ledger
            .charge_payment(PaymentRequest {
                reservation_id: first.id,
                amount: first.total_value,
                currency: first.currency,
                description: "stay".to_string(),
                token: "tok_visa".to_string(),
            })
            .await
            .unwrap();
        let order_b = fx
            .ledger
            .charge_payment(PaymentRequest {
                reservation_id: second.id,
                amount: second.total_value,
                currency: second.currency,
                description: "stay".to_string(),
                token: "tok_visa".to_string(),
            })
            .await
            .unwrap();

        let ledger_a = fx.ledger.clone();
        let ledger_b = fx.ledger.clone();
        let (result_a, result_b) = tokio::join!(
            tokio::spawn(async move { ledger_a.confirm_payment(first.id, order_a.id).await }),
            tokio::spawn(async move { ledger_b.confirm_payment(second.id, order_b.id).await }),
        );

        let outcomes = [result_a.unwrap(), result_b.unwrap()];
        let paid = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(booking_core::Error::DateUnavailable { .. })))
            .count();

        assert_eq!(paid, 1, "exactly one confirmation must win");
        assert_eq!(conflicts, 1, "the loser must see the conflict");

        // Ledger reflects only the winner
        for day in 0..3i64 {
            let date = start + Duration::days(day);
            assert_eq!(fx.ledger.occupancy(fx.listing.id, date).await.unwrap(), 3);
        }

        // Loser is CANCELLED
        let statuses: Vec<ReservationStatus> = {
            let all = fx
                .ledger
                .list_reservations(PageRequest::default())
                .await
                .unwrap();
            all.items.iter().map(|r| r.status).collect()
        };
        assert!(statuses.contains(&ReservationStatus::Paid));
        assert!(statuses.contains(&ReservationStatus::Cancelled));
    }

    /// Full lifecycle against elapsed dates: confirm commits, reads close,
    /// deletion is gated until the stay has elapsed.
    #[tokio::test]
    async fn test_lifecycle_close_and_delete() {
        let fx = fixture().await;
        let today = chrono::Utc::now().date_naive();

        // Elapsed stay
        let past = fx
            .ledger
            .create_reservation(request(
                &fx,
                today - Duration::days(10),
                today - Duration::days(8),
                2,
            ))
            .await
            .unwrap();
        charge_and_confirm(&fx, &past).await.unwrap();

        // Read applies lazy close on every path
        let read = fx.ledger.get_reservation(past.id).await.unwrap();
        assert_eq!(read.status, ReservationStatus::Closed);
        let by_email = fx
            .ledger
            .list_reservations_for_customer("ana@example.com")
            .await
            .unwrap();
        assert_eq!(by_email[0].status, ReservationStatus::Closed);

        // Elapsed: deletable
        fx.ledger.delete_reservation(past.id).await.unwrap();

        // Future stay: not deletable
        let future = fx
            .ledger
            .create_reservation(request(
                &fx,
                today + Duration::days(8),
                today + Duration::days(10),
                2,
            ))
            .await
            .unwrap();
        assert!(matches!(
            fx.ledger.delete_reservation(future.id).await,
            Err(booking_core::Error::ReservationNotFinalized(_))
        ));
    }

    /// The worked capacity example: capacity 4, a confirmed stay of 3, then
    /// a request for 2 over the same range fails at creation listing every
    /// date of the range.
    #[tokio::test]
    async fn test_remaining_capacity_example() {
        let fx = fixture().await;
        let start = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 1, 12).unwrap();

        let first = fx
            .ledger
            .create_reservation(request(&fx, start, end, 3))
            .await
            .unwrap();
        charge_and_confirm(&fx, &first).await.unwrap();

        match fx.ledger.create_reservation(request(&fx, start, end, 2)).await {
            Err(booking_core::Error::DateUnavailable { dates }) => {
                assert_eq!(
                    dates,
                    vec![
                        start,
                        NaiveDate::from_ymd_opt(2030, 1, 11).unwrap(),
                        end
                    ]
                );
            }
            other => panic!(
                "expected DateUnavailable, got {:?}",
                other.map(|r| r.status)
            ),
        }

        // One more still fits
        let third = fx
            .ledger
            .create_reservation(request(&fx, start, end, 1))
            .await
            .unwrap();
        charge_and_confirm(&fx, &third).await.unwrap();
        assert_eq!(fx.ledger.occupancy(fx.listing.id, start).await.unwrap(), 4);
    }

    /// Headcount beyond capacity is a business-rule violation independent
    /// of per-date availability.
    #[tokio::test]
    async fn test_headcount_over_capacity() {
        let fx = fixture().await;

        let result = fx
            .ledger
            .create_reservation(request(
                &fx,
                base_date(),
                base_date() + Duration::days(2),
                DAILY_CAPACITY + 1,
            ))
            .await;
        assert!(matches!(
            result,
            Err(booking_core::Error::BusinessRuleViolation {
                daily_capacity: DAILY_CAPACITY,
                requested: 5
            })
        ));
    }
}
