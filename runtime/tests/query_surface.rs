//! Query surface reads against the in-memory ledger.

#![allow(clippy::unwrap_used)]

use boxoffice_core::{EventId, LedgerError, QueryError, SeatId, SeatStatus};
use boxoffice_runtime::SeatQuery;
use boxoffice_testing::{EventFixture, InMemorySeatLedger, LedgerOperation};
use std::sync::Arc;

#[tokio::test]
async fn lists_every_event() {
    let ledger = Arc::new(InMemorySeatLedger::new());
    EventFixture::demo().seed(&ledger);
    EventFixture::scenario().seed(&ledger);

    let events = SeatQuery::new(ledger).list_events().await.unwrap();

    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Ultimate Music Experience", "Scenario Night"]);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let ledger = Arc::new(InMemorySeatLedger::new());

    let err = SeatQuery::new(ledger)
        .seat_map(EventId::new(42))
        .await
        .unwrap_err();

    assert_eq!(err, QueryError::EventNotFound(EventId::new(42)));
}

#[tokio::test]
async fn repeated_reads_without_writes_are_identical() {
    let ledger = Arc::new(InMemorySeatLedger::new());
    let seeded = EventFixture::demo().seed(&ledger);
    let query = SeatQuery::new(ledger);

    let first = query.seat_map(seeded.event_id).await.unwrap();
    let second = query.seat_map(seeded.event_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.available(), first.total());
}

#[tokio::test]
async fn find_seats_keeps_request_order_and_marks_unknown() {
    let ledger = Arc::new(InMemorySeatLedger::new());
    let seeded = EventFixture::scenario().seed(&ledger);
    let query = SeatQuery::new(ledger);

    let seats = query
        .find_seats(&[seeded.seat_id("A3"), SeatId::new(77), seeded.seat_id("A1")])
        .await
        .unwrap();

    assert_eq!(seats[0].as_ref().unwrap().code, "A3");
    assert!(seats[1].is_none());
    assert_eq!(seats[2].as_ref().unwrap().status, SeatStatus::Available);
}

#[tokio::test]
async fn unreachable_ledger_is_unavailable() {
    let ledger = Arc::new(InMemorySeatLedger::new());
    ledger.fail_next(
        LedgerOperation::Read,
        LedgerError::StoreUnavailable("pool timed out".to_string()),
    );

    let err = SeatQuery::new(ledger).ping().await.unwrap_err();

    assert_eq!(err, QueryError::StoreUnavailable("pool timed out".to_string()));
}
