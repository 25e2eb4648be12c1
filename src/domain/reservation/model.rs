//! Reservation domain entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    /// Currently parked
    Active,
    /// Spot released and stay billed
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user occupying one spot for an interval of time
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub spot_id: i32,
    pub user_id: String,
    pub parking_timestamp: DateTime<Utc>,
    /// Set together with `parking_cost` when the reservation completes
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub parking_cost: Option<Decimal>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Transition `Active → Completed`, setting exit time and cost together.
    pub fn complete(&mut self, exit: DateTime<Utc>, cost: Decimal) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::InvalidState(format!(
                "reservation {} is {}, expected active",
                self.id, self.status
            )));
        }
        if exit < self.parking_timestamp {
            return Err(DomainError::InvalidInput(
                "exit time is before entry time".into(),
            ));
        }
        if cost < Decimal::ZERO {
            return Err(DomainError::InvalidInput("cost must not be negative".into()));
        }

        self.leaving_timestamp = Some(exit);
        self.parking_cost = Some(cost);
        self.status = ReservationStatus::Completed;
        Ok(())
    }
}

/// Reservation joined with its spot and lot, for history and active views
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub lot_id: i32,
    pub prime_location_name: String,
    pub address: String,
    pub hourly_price: Decimal,
}

/// Bookings and spend for one calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyUsage {
    /// `YYYY-MM` of the entry timestamps
    pub month: String,
    pub bookings: u64,
    /// Sum of costs; active reservations contribute nothing
    pub total_cost: Decimal,
}

/// Group reservations by the month they started in, newest month first,
/// keeping at most `months` entries.
pub fn monthly_usage<'a, I>(reservations: I, months: usize) -> Vec<MonthlyUsage>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    let mut by_month: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();

    for r in reservations {
        let key = r.parking_timestamp.format("%Y-%m").to_string();
        let entry = by_month.entry(key).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        if let Some(cost) = r.parking_cost {
            entry.1 += cost;
        }
    }

    by_month
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (bookings, total_cost))| MonthlyUsage {
            month,
            bookings,
            total_cost,
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    fn completed(id: i32, entry: DateTime<Utc>, cost: i64) -> Reservation {
        Reservation {
            id,
            spot_id: 1,
            user_id: "u1".into(),
            parking_timestamp: entry,
            leaving_timestamp: Some(entry + Duration::hours(1)),
            parking_cost: Some(Decimal::from(cost)),
            status: ReservationStatus::Completed,
        }
    }

    fn active(id: i32, entry: DateTime<Utc>) -> Reservation {
        Reservation {
            id,
            spot_id: 2,
            user_id: "u1".into(),
            parking_timestamp: entry,
            leaving_timestamp: None,
            parking_cost: None,
            status: ReservationStatus::Active,
        }
    }

    #[test]
    fn complete_sets_exit_and_cost_together() {
        let mut r = active(1, at(2024, 1, 1));
        r.complete(at(2024, 1, 1) + Duration::hours(2), Decimal::from(20))
            .unwrap();
        assert_eq!(r.status, ReservationStatus::Completed);
        assert_eq!(r.parking_cost, Some(Decimal::from(20)));
        assert!(r.leaving_timestamp.is_some());
    }

    #[test]
    fn complete_twice_is_invalid_state() {
        let mut r = completed(1, at(2024, 1, 1), 10);
        let err = r.complete(at(2024, 1, 2), Decimal::from(10)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(r.parking_cost, Some(Decimal::from(10)));
    }

    #[test]
    fn complete_rejects_exit_before_entry() {
        let mut r = active(1, at(2024, 1, 2));
        assert!(r.complete(at(2024, 1, 1), Decimal::from(10)).is_err());
        assert!(r.is_active());
    }

    #[test]
    fn monthly_usage_groups_and_sorts_descending() {
        let rs = vec![
            completed(1, at(2024, 1, 5), 5),
            completed(2, at(2024, 1, 20), 15),
            completed(3, at(2024, 2, 3), 15),
        ];

        let usage = monthly_usage(&rs, 6);
        assert_eq!(
            usage,
            vec![
                MonthlyUsage {
                    month: "2024-02".into(),
                    bookings: 1,
                    total_cost: Decimal::from(15)
                },
                MonthlyUsage {
                    month: "2024-01".into(),
                    bookings: 2,
                    total_cost: Decimal::from(20)
                },
            ]
        );
    }

    #[test]
    fn monthly_usage_counts_active_without_cost() {
        let rs = vec![completed(1, at(2024, 5, 1), 30), active(2, at(2024, 5, 2))];
        let usage = monthly_usage(&rs, 6);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].bookings, 2);
        assert_eq!(usage[0].total_cost, Decimal::from(30));
    }

    #[test]
    fn monthly_usage_keeps_most_recent_months() {
        let rs: Vec<Reservation> = (1..=8)
            .map(|m| completed(m as i32, at(2023, m, 1), 1))
            .collect();
        let usage = monthly_usage(&rs, 6);
        let months: Vec<&str> = usage.iter().map(|u| u.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["2023-08", "2023-07", "2023-06", "2023-05", "2023-04", "2023-03"]
        );
    }

    #[test]
    fn month_keys_sort_across_years() {
        let rs = vec![completed(1, at(2023, 12, 31), 1), completed(2, at(2024, 1, 1), 1)];
        let usage = monthly_usage(&rs, 6);
        assert_eq!(usage[0].month, "2024-01");
        assert_eq!(usage[1].month, "2023-12");
    }
}
