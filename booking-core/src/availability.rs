//! Availability checking over the occupancy ledger
//!
//! A pure read: the checker never mutates, so it is safe to call repeatedly.
//! It runs once at reservation creation and again at payment confirmation,
//! where the answer may have changed in the interim.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::{Listing, ListingId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of a range check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAvailability {
    /// True iff every date in the range is feasible
    pub available: bool,

    /// Every infeasible date (not just the first), so the caller can
    /// report all problems at once
    pub conflicting_dates: Vec<NaiveDate>,
}

/// Every calendar date in `[start, end]` inclusive.
pub fn date_span(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Check whether `headcount` fits every date of `[start, end]` for a listing.
///
/// Precondition: a headcount above the listing's daily capacity can never
/// fit any date and is rejected as a business-rule violation, distinct from
/// per-date conflicts. A reversed range is rejected outright.
pub fn check_range(
    storage: &Storage,
    listing: &Listing,
    start: NaiveDate,
    end: NaiveDate,
    headcount: u32,
) -> Result<RangeAvailability> {
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }

    if headcount > listing.daily_capacity {
        return Err(Error::BusinessRuleViolation {
            daily_capacity: listing.daily_capacity,
            requested: headcount,
        });
    }

    let mut conflicting_dates = Vec::new();
    for date in date_span(start, end) {
        let reserved = storage.reserved_count(&listing.id, date)?;
        if reserved + headcount > listing.daily_capacity {
            conflicting_dates.push(date);
        }
    }

    Ok(RangeAvailability {
        available: conflicting_dates.is_empty(),
        conflicting_dates,
    })
}

/// Filter candidate listings down to those fully available for the range.
///
/// Candidates come from the catalog collaborator (city/category search is
/// out of scope here). A candidate whose daily capacity cannot fit the
/// headcount at all is simply not available, not an error.
pub fn filter_available_listings(
    storage: &Storage,
    candidates: &[Listing],
    start: NaiveDate,
    end: NaiveDate,
    headcount: u32,
) -> Result<Vec<ListingId>> {
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }

    let mut available = Vec::new();
    for listing in candidates {
        if headcount > listing.daily_capacity {
            continue;
        }
        if check_range(storage, listing, start, end, headcount)?.available {
            available.push(listing.id);
        }
    }

    Ok(available)
}
