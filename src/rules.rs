//! Pure booking rules: status machine, inclusive date-range overlap and
//! pricing. Everything here is deterministic; the clock and randomness are
//! passed in by the services so the rules can be tested without a database.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Active bookings are the ones that block a vehicle: pending or confirmed.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Available,
    Booked,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Booked => "booked",
            VehicleStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(VehicleStatus::Available),
            "booked" => Some(VehicleStatus::Booked),
            "maintenance" => Some(VehicleStatus::Maintenance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Complete,
    Cancel,
}

impl BookingAction {
    pub const ALL: [BookingAction; 3] = [
        BookingAction::Confirm,
        BookingAction::Complete,
        BookingAction::Cancel,
    ];
}

/// Reject a range unless `end_date` is strictly after `start_date`.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<()> {
    if end_date <= start_date {
        return Err(AppError::BadRequest(
            "end_date must be after start_date".into(),
        ));
    }
    Ok(())
}

/// Inclusive date-range overlap: either endpoint of one range falls within
/// the other, or the existing range is fully contained in the requested one.
/// The boundary day counts, so a booking ending on the day another starts is
/// a conflict (no same-day turnover).
pub fn ranges_overlap(
    req_start: NaiveDate,
    req_end: NaiveDate,
    other_start: NaiveDate,
    other_end: NaiveDate,
) -> bool {
    (other_start >= req_start && other_start <= req_end)
        || (other_end >= req_start && other_end <= req_end)
        || (other_start <= req_start && other_end >= req_end)
}

/// Inclusive day count and total for a rental. A span of `start..start + 2`
/// is three billable days.
pub fn rental_total(
    start_date: NaiveDate,
    end_date: NaiveDate,
    price_per_day: Decimal,
) -> (i32, Decimal) {
    let total_days = (end_date - start_date).num_days() as i32 + 1;
    let total_amount = (Decimal::from(total_days) * price_per_day).round_dp(2);
    (total_days, total_amount)
}

/// Booking number format: `BK<year><5-digit zero-padded>`. Uniqueness is
/// enforced by the caller's retry loop and the database unique index.
pub fn booking_number(year: i32, n: u32) -> String {
    format!("BK{year}{n:05}")
}

/// Validate a lifecycle transition and return the resulting status.
///
/// Confirm: pending only. Complete: confirmed only. Cancel: pending or
/// confirmed, and only while the start date is still in the future.
/// Completed and cancelled are terminal.
pub fn check_transition(
    current: BookingStatus,
    action: BookingAction,
    start_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<BookingStatus> {
    match action {
        BookingAction::Confirm => {
            if current != BookingStatus::Pending {
                return Err(AppError::InvalidTransition(
                    "Only pending bookings can be confirmed".into(),
                ));
            }
            Ok(BookingStatus::Confirmed)
        }
        BookingAction::Complete => {
            if current != BookingStatus::Confirmed {
                return Err(AppError::InvalidTransition(
                    "Only confirmed bookings can be completed".into(),
                ));
            }
            Ok(BookingStatus::Completed)
        }
        BookingAction::Cancel => {
            if !current.is_active() {
                return Err(AppError::InvalidTransition(
                    "Only pending or confirmed bookings can be cancelled".into(),
                ));
            }
            if start_date <= today {
                return Err(AppError::InvalidTransition(
                    "Bookings can only be cancelled before their start date".into(),
                ));
            }
            Ok(BookingStatus::Cancelled)
        }
    }
}

/// Dates, locations and notes may change only while the booking is pending
/// and has not started yet.
pub fn check_modifiable(
    current: BookingStatus,
    start_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<()> {
    if current != BookingStatus::Pending || start_date <= today {
        return Err(AppError::InvalidTransition(
            "Only pending bookings with a future start date can be modified".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_range_must_be_strictly_increasing() {
        assert!(validate_date_range(d(2024, 6, 1), d(2024, 6, 2)).is_ok());
        assert!(validate_date_range(d(2024, 6, 1), d(2024, 6, 1)).is_err());
        assert!(validate_date_range(d(2024, 6, 2), d(2024, 6, 1)).is_err());
    }

    #[test]
    fn overlap_truth_table() {
        let s = d(2024, 1, 10);
        let e = d(2024, 1, 20);

        // identical, contained, containing
        assert!(ranges_overlap(s, e, s, e));
        assert!(ranges_overlap(s, e, d(2024, 1, 12), d(2024, 1, 18)));
        assert!(ranges_overlap(s, e, d(2024, 1, 5), d(2024, 1, 25)));

        // partial overlaps on both sides
        assert!(ranges_overlap(s, e, d(2024, 1, 5), d(2024, 1, 10)));
        assert!(ranges_overlap(s, e, d(2024, 1, 20), d(2024, 1, 25)));

        // clear of the range on both sides
        assert!(!ranges_overlap(s, e, d(2024, 1, 1), d(2024, 1, 9)));
        assert!(!ranges_overlap(s, e, d(2024, 1, 21), d(2024, 1, 30)));
    }

    #[test]
    fn shared_boundary_day_is_a_conflict() {
        // Booking A runs Jan 1-3; a request for Jan 3-5 shares Jan 3.
        assert!(ranges_overlap(d(2024, 1, 3), d(2024, 1, 5), d(2024, 1, 1), d(2024, 1, 3)));
        // And the mirror case: request ends on the day A starts.
        assert!(ranges_overlap(d(2023, 12, 29), d(2024, 1, 1), d(2024, 1, 1), d(2024, 1, 3)));
    }

    #[test]
    fn rental_total_counts_days_inclusively() {
        let price = Decimal::new(4000, 2); // 40.00
        let (days, amount) = rental_total(d(2024, 6, 1), d(2024, 6, 3), price);
        assert_eq!(days, 3);
        assert_eq!(amount, Decimal::new(12000, 2)); // 120.00

        let (days, amount) = rental_total(d(2024, 6, 1), d(2024, 6, 2), price);
        assert_eq!(days, 2);
        assert_eq!(amount, Decimal::new(8000, 2));
    }

    #[test]
    fn rental_total_rounds_to_cents() {
        let price = Decimal::from_str_exact("33.333").unwrap();
        let (days, amount) = rental_total(d(2024, 6, 1), d(2024, 6, 3), price);
        assert_eq!(days, 3);
        assert_eq!(amount, Decimal::from_str_exact("100.00").unwrap());
    }

    #[test]
    fn transition_table_is_exhaustive() {
        let today = d(2024, 6, 1);
        let future = d(2024, 6, 10);

        for status in BookingStatus::ALL {
            for action in BookingAction::ALL {
                let result = check_transition(status, action, future, today);
                let expected = match (status, action) {
                    (BookingStatus::Pending, BookingAction::Confirm) => {
                        Some(BookingStatus::Confirmed)
                    }
                    (BookingStatus::Confirmed, BookingAction::Complete) => {
                        Some(BookingStatus::Completed)
                    }
                    (BookingStatus::Pending, BookingAction::Cancel)
                    | (BookingStatus::Confirmed, BookingAction::Cancel) => {
                        Some(BookingStatus::Cancelled)
                    }
                    _ => None,
                };
                match expected {
                    Some(next) => assert_eq!(result.unwrap(), next),
                    None => assert!(
                        matches!(result, Err(AppError::InvalidTransition(_))),
                        "{status:?} + {action:?} should be rejected"
                    ),
                }
            }
        }
    }

    #[test]
    fn terminal_states_reject_every_action() {
        let today = d(2024, 6, 1);
        for status in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for action in BookingAction::ALL {
                let result = check_transition(status, action, d(2024, 6, 10), today);
                assert!(matches!(result, Err(AppError::InvalidTransition(_))));
            }
        }
    }

    #[test]
    fn cancel_requires_future_start_date() {
        let today = d(2024, 6, 10);
        // starts today: too late
        assert!(check_transition(BookingStatus::Pending, BookingAction::Cancel, today, today).is_err());
        // already started
        assert!(
            check_transition(BookingStatus::Confirmed, BookingAction::Cancel, d(2024, 6, 5), today)
                .is_err()
        );
        assert!(
            check_transition(BookingStatus::Pending, BookingAction::Cancel, d(2024, 6, 11), today)
                .is_ok()
        );
    }

    #[test]
    fn modification_only_while_pending_and_future() {
        let today = d(2024, 6, 10);
        assert!(check_modifiable(BookingStatus::Pending, d(2024, 6, 11), today).is_ok());
        assert!(check_modifiable(BookingStatus::Pending, today, today).is_err());
        assert!(check_modifiable(BookingStatus::Confirmed, d(2024, 6, 11), today).is_err());
        assert!(check_modifiable(BookingStatus::Cancelled, d(2024, 6, 11), today).is_err());
    }

    #[test]
    fn booking_number_format() {
        assert_eq!(booking_number(2024, 7), "BK202400007");
        assert_eq!(booking_number(2024, 99999), "BK202499999");
    }

    #[test]
    fn booking_numbers_stay_unique_under_retry() {
        // Emulate the service's generate loop: draw random candidates and
        // retry on collision against everything already stored.
        let mut rng = rand::thread_rng();
        let mut taken: HashSet<String> = HashSet::new();
        for _ in 0..10_000 {
            let number = loop {
                let candidate = booking_number(2024, rng.gen_range(1..=99_999));
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            assert!(taken.insert(number));
        }
        assert_eq!(taken.len(), 10_000);
    }
}
