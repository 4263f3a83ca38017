//! Seed data for tests.
//!
//! ```
//! use boxoffice_testing::{EventFixture, InMemorySeatLedger};
//!
//! let ledger = InMemorySeatLedger::new();
//! let seeded = EventFixture::scenario().seed(&ledger);
//! assert_eq!(seeded.seat_ids.len(), 3);
//! ```

use crate::ledger::InMemorySeatLedger;
use crate::mocks::test_clock;
use boxoffice_core::environment::Clock;
use boxoffice_core::{EventId, Money, SeatId};
use std::collections::BTreeMap;

/// One section of a fixture event.
#[derive(Debug, Clone)]
pub struct SectionFixture {
    /// Section name
    pub name: String,
    /// VIP tier flag
    pub is_vip: bool,
    /// Row labels
    pub rows: Vec<String>,
    /// Seats per row, numbered from 1
    pub seats_per_row: i32,
    /// Price of every seat in the section
    pub price: Money,
}

/// Builder for an event with sections and seats.
#[derive(Debug, Clone)]
pub struct EventFixture {
    name: String,
    venue: String,
    sections: Vec<SectionFixture>,
}

impl EventFixture {
    /// An event with no sections yet.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            venue: "Main Hall".to_string(),
            sections: Vec::new(),
        }
    }

    /// Three VIP seats A1..A3 at 200.00.
    #[must_use]
    pub fn scenario() -> Self {
        Self::new("Scenario Night").section("VIP", true, &["A"], 3, 200)
    }

    /// The demo layout: VIP A–B ×10 @200, Premium C–G ×15 @100,
    /// Standard H–Q ×15 @50.
    #[must_use]
    pub fn demo() -> Self {
        Self::new("Ultimate Music Experience")
            .section("VIP", true, &["A", "B"], 10, 200)
            .section("Premium", false, &["C", "D", "E", "F", "G"], 15, 100)
            .section(
                "Standard",
                false,
                &["H", "I", "J", "K", "L", "M", "N", "O", "P", "Q"],
                15,
                50,
            )
    }

    /// Set the venue.
    #[must_use]
    pub fn venue(mut self, venue: &str) -> Self {
        self.venue = venue.to_string();
        self
    }

    /// Add a section priced in whole currency units.
    #[must_use]
    pub fn section(
        mut self,
        name: &str,
        is_vip: bool,
        rows: &[&str],
        seats_per_row: i32,
        price_units: u64,
    ) -> Self {
        self.sections.push(SectionFixture {
            name: name.to_string(),
            is_vip,
            rows: rows.iter().map(ToString::to_string).collect(),
            seats_per_row,
            price: Money::from_cents(price_units.saturating_mul(100)),
        });
        self
    }

    /// Write the event into `ledger`.
    pub fn seed(&self, ledger: &InMemorySeatLedger) -> SeededEvent {
        let event_id = ledger.insert_event(&self.name, &self.venue, test_clock().now(), 120);
        let mut seat_ids = BTreeMap::new();

        for section in &self.sections {
            let section_id = ledger.insert_section(event_id, &section.name, section.is_vip);
            for row in &section.rows {
                for number in 1..=section.seats_per_row {
                    let id = ledger.insert_seat(section_id, row, number, section.price);
                    seat_ids.insert(format!("{row}{number}"), id);
                }
            }
        }

        SeededEvent { event_id, seat_ids }
    }
}

/// Ids of a seeded fixture event.
#[derive(Debug, Clone)]
pub struct SeededEvent {
    /// Event id
    pub event_id: EventId,
    /// Seat ids by seat code
    pub seat_ids: BTreeMap<String, SeatId>,
}

impl SeededEvent {
    /// Id of the seat with `code`.
    ///
    /// # Panics
    ///
    /// If the fixture has no such seat.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn seat_id(&self, code: &str) -> SeatId {
        match self.seat_ids.get(code) {
            Some(id) => *id,
            None => panic!("fixture has no seat {code}"),
        }
    }

    /// Ids of the seats with `codes`, in the order given.
    #[must_use]
    pub fn seat_ids_for(&self, codes: &[&str]) -> Vec<SeatId> {
        codes.iter().map(|code| self.seat_id(code)).collect()
    }
}
