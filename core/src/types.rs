//! Domain types for the seat inventory.
//!
//! Events, sections, seats and bookings as the ledger stores them, plus the
//! read-side projections (`SeatView`, `SeatMap`) and the request shape the
//! booking engine accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw ledger key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw ledger key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ledger_id!(
    /// Unique identifier for an event
    EventId
);
ledger_id!(
    /// Unique identifier for a seat section
    SectionId
);
ledger_id!(
    /// Unique identifier for a seat
    SeatId
);
ledger_id!(
    /// Unique identifier for a committed booking
    BookingId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units with overflow checking
    #[must_use]
    pub const fn checked_from_units(units: u64) -> Option<Self> {
        match units.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Amount in currency units, as rendered on the wire (`200.0`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Ticket prices are far below 2^52 cents
    pub fn as_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Sum a sequence of amounts, `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// A ticketed event. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Long description
    pub description: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// Venue name
    pub venue: String,
    /// Duration in minutes
    pub duration: i32,
}

/// A named grouping of seats sharing pricing and VIP tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section identifier
    pub id: SectionId,
    /// Owning event
    pub event_id: EventId,
    /// Display name ("VIP", "Premium", ...)
    pub name: String,
    /// VIP tier flag
    pub is_vip: bool,
}

/// Booking state of a seat.
///
/// Transitions only `Available → Booked`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    /// Free to book
    Available,
    /// Claimed by a committed booking
    Booked,
}

impl SeatStatus {
    /// Convert status to its ledger string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
        }
    }

    /// Parse status from its ledger string representation.
    ///
    /// # Errors
    ///
    /// Returns the unrecognised string if it is not a known status.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "available" => Ok(Self::Available),
            "booked" => Ok(Self::Booked),
            other => Err(format!("Invalid seat status: {other}")),
        }
    }

    /// Whether the seat can still be claimed.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bookable seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Seat identifier
    pub id: SeatId,
    /// Owning event
    pub event_id: EventId,
    /// Owning section
    pub section_id: SectionId,
    /// Row label ("A")
    pub row: String,
    /// Number within the row
    pub number: i32,
    /// Human-readable code, row + number ("A1"), unique per event
    pub code: String,
    /// Current status
    pub status: SeatStatus,
    /// Ticket price
    pub price: Money,
}

/// Seat joined with its section, as shown on a seat map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatView {
    /// The seat itself
    pub seat: Seat,
    /// Section name
    pub section: String,
    /// Section VIP flag
    pub is_vip: bool,
}

/// Consistent snapshot of an event's seats.
///
/// Counts are derived from `seats`, so `available` always equals the number of
/// available seats in the same snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatMap {
    /// The event
    pub event: Event,
    /// Seats ordered by section, row and number
    pub seats: Vec<SeatView>,
}

impl SeatMap {
    /// Build a seat map from a single snapshot.
    #[must_use]
    pub const fn new(event: Event, seats: Vec<SeatView>) -> Self {
        Self { event, seats }
    }

    /// Total number of seats.
    #[must_use]
    pub fn total(&self) -> usize {
        self.seats.len()
    }

    /// Number of seats still available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.seats
            .iter()
            .filter(|view| view.seat.status.is_available())
            .count()
    }

    /// Identifiers of booked seats.
    pub fn booked_ids(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats
            .iter()
            .filter(|view| !view.seat.status.is_available())
            .map(|view| view.seat.id)
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Human-readable booking reference (`TKT-7QK2M9XD`). Unique across the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingReference(String);

impl BookingReference {
    /// Wrap a generated reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact details captured with a booking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
}

/// A request to claim a set of seats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRequest {
    /// Who is booking
    pub customer: Customer,
    /// Free-form ticket type tag ("standard", "student", ...)
    pub ticket_type: String,
    /// Requested seats, possibly unordered and with duplicates
    pub seat_ids: Vec<SeatId>,
}

impl BookingRequest {
    /// Requested seats deduplicated and sorted ascending.
    ///
    /// Every lock acquisition uses this order, so overlapping requests cannot
    /// deadlock on each other.
    #[must_use]
    pub fn canonical_seat_ids(&self) -> Vec<SeatId> {
        self.seat_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Booking row about to be inserted inside a ledger transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBooking {
    /// Generated reference
    pub reference: BookingReference,
    /// Contact details
    pub customer: Customer,
    /// Ticket type tag
    pub ticket_type: String,
    /// Sum of the locked seats' prices
    pub total: Money,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A seat as recorded on a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSeat {
    /// Seat identifier
    pub id: SeatId,
    /// Seat code
    pub code: String,
}

/// A committed booking. Immutable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Booking {
    /// Ledger identifier
    pub id: BookingId,
    /// Unique reference
    pub reference: BookingReference,
    /// Contact details
    pub customer: Customer,
    /// Ticket type tag
    pub ticket_type: String,
    /// Total charged
    pub total: Money,
    /// Commit time
    pub created_at: DateTime<Utc>,
    /// Claimed seats, ascending by id
    pub seats: Vec<BookedSeat>,
}

impl Booking {
    /// Identifiers of the claimed seats.
    #[must_use]
    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(|seat| seat.id).collect()
    }

    /// Codes of the claimed seats.
    #[must_use]
    pub fn seat_codes(&self) -> Vec<String> {
        self.seats.iter().map(|seat| seat.code.clone()).collect()
    }
}

/// Outcome of locking a seat set inside a ledger transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatClaim {
    /// Rows that exist and are now locked, ascending by id
    pub locked: Vec<Seat>,
    /// Codes of requested seats that are missing or already booked
    pub unavailable: Vec<String>,
}

impl SeatClaim {
    /// Reconcile the requested ids against the rows the ledger locked.
    ///
    /// A requested id with no row is reported as `#<id>`.
    #[must_use]
    pub fn from_locked(requested: &[SeatId], mut locked: Vec<Seat>) -> Self {
        locked.sort_by_key(|seat| seat.id);

        let unavailable = requested
            .iter()
            .filter_map(|id| match locked.binary_search_by_key(id, |seat| seat.id) {
                Ok(index) if locked[index].status.is_available() => None,
                Ok(index) => Some(locked[index].code.clone()),
                Err(_) => Some(missing_seat_code(*id)),
            })
            .collect();

        Self {
            locked,
            unavailable,
        }
    }

    /// True when every requested seat exists and is available.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.unavailable.is_empty()
    }

    /// Distinct events the locked seats belong to.
    #[must_use]
    pub fn event_ids(&self) -> BTreeSet<EventId> {
        self.locked.iter().map(|seat| seat.event_id).collect()
    }

    /// Sum of the locked seats' prices, `None` on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Money> {
        Money::checked_sum(self.locked.iter().map(|seat| seat.price))
    }
}

/// Code used for a requested seat id the ledger does not know.
#[must_use]
pub fn missing_seat_code(id: SeatId) -> String {
    format!("#{id}")
}

// ============================================================================
// Notifications
// ============================================================================

/// Seats whose status changed. Observers re-read the seat map for details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatUpdate {
    /// Seats that changed, ascending
    pub seat_ids: Vec<SeatId>,
}

impl SeatUpdate {
    /// Wrap a set of changed seats.
    #[must_use]
    pub const fn new(seat_ids: Vec<SeatId>) -> Self {
        Self { seat_ids }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seat(id: i64, code: &str, status: SeatStatus, cents: u64) -> Seat {
        Seat {
            id: SeatId::new(id),
            event_id: EventId::new(1),
            section_id: SectionId::new(1),
            row: code[..1].to_string(),
            number: code[1..].parse().unwrap(),
            code: code.to_string(),
            status,
            price: Money::from_cents(cents),
        }
    }

    #[test]
    fn money_display_and_units() {
        let price = Money::from_cents(20_050);
        assert_eq!(price.to_string(), "200.50");
        assert!((price.as_units() - 200.5).abs() < f64::EPSILON);
        assert_eq!(Money::checked_from_units(50), Some(Money::from_cents(5_000)));
    }

    #[test]
    fn money_sum_detects_overflow() {
        let total = Money::checked_sum([Money::from_cents(u64::MAX), Money::from_cents(1)]);
        assert_eq!(total, None);
    }

    #[test]
    fn seat_status_round_trips_through_ledger_strings() {
        assert_eq!(SeatStatus::parse("booked"), Ok(SeatStatus::Booked));
        assert_eq!(SeatStatus::Available.as_str(), "available");
        assert!(SeatStatus::parse("held").is_err());
    }

    #[test]
    fn claim_reports_booked_and_missing_seats() {
        let requested = [SeatId::new(1), SeatId::new(2), SeatId::new(9)];
        let claim = SeatClaim::from_locked(
            &requested,
            vec![
                seat(2, "A2", SeatStatus::Booked, 100),
                seat(1, "A1", SeatStatus::Available, 100),
            ],
        );

        assert_eq!(claim.unavailable, vec!["A2".to_string(), "#9".to_string()]);
        assert!(!claim.is_clear());
        assert_eq!(claim.locked[0].id, SeatId::new(1));
    }

    #[test]
    fn clear_claim_sums_prices() {
        let requested = [SeatId::new(1), SeatId::new(2)];
        let claim = SeatClaim::from_locked(
            &requested,
            vec![
                seat(1, "A1", SeatStatus::Available, 20_000),
                seat(2, "A2", SeatStatus::Available, 10_000),
            ],
        );

        assert!(claim.is_clear());
        assert_eq!(claim.total(), Some(Money::from_cents(30_000)));
        assert_eq!(claim.event_ids().len(), 1);
    }

    #[test]
    fn seat_map_counts_follow_the_snapshot() {
        let event = Event {
            id: EventId::new(1),
            name: "Show".to_string(),
            description: String::new(),
            date: Utc::now(),
            venue: "Hall".to_string(),
            duration: 90,
        };
        let view = |s: Seat| SeatView {
            seat: s,
            section: "VIP".to_string(),
            is_vip: true,
        };
        let map = SeatMap::new(
            event,
            vec![
                view(seat(1, "A1", SeatStatus::Available, 100)),
                view(seat(2, "A2", SeatStatus::Booked, 100)),
                view(seat(3, "A3", SeatStatus::Booked, 100)),
            ],
        );

        assert_eq!(map.total(), 3);
        assert_eq!(map.available(), 1);
        assert_eq!(
            map.booked_ids().collect::<Vec<_>>(),
            vec![SeatId::new(2), SeatId::new(3)]
        );
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&vec![SeatId::new(4), SeatId::new(7)]).unwrap();
        assert_eq!(json, "[4,7]");
    }

    proptest! {
        #[test]
        fn canonical_seat_ids_are_sorted_and_unique(ids in proptest::collection::vec(0i64..50, 1..40)) {
            let request = BookingRequest {
                customer: Customer::default(),
                ticket_type: "standard".to_string(),
                seat_ids: ids.iter().copied().map(SeatId::new).collect(),
            };
            let canonical = request.canonical_seat_ids();

            prop_assert!(canonical.windows(2).all(|pair| pair[0] < pair[1]));
            for id in &ids {
                prop_assert!(canonical.contains(&SeatId::new(*id)));
            }
        }
    }
}
