//! `/ws` end to end: a real listener, a real WebSocket client, a booking
//! committed through the engine.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests can use expect for setup

use boxoffice_core::{BookingRequest, SeatId};
use boxoffice_runtime::{
    AvailabilityNotifier, BookingConfig, BookingEngine, NotifierConfig, SeatQuery,
};
use boxoffice_testing::{
    EventFixture, InMemorySeatLedger, SequentialReferenceGenerator, test_clock, test_customer,
};
use boxoffice_web::{AppState, build_router};
use futures::StreamExt;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn observer_receives_one_update_for_a_committed_booking() {
    let ledger = Arc::new(InMemorySeatLedger::new());
    let seeded = EventFixture::scenario().seed(&ledger);

    let notifier = Arc::new(AvailabilityNotifier::new(&NotifierConfig::default()));
    let (handle, _dispatcher) = notifier.spawn_dispatcher(16);
    let engine = BookingEngine::new(
        Arc::clone(&ledger),
        Arc::new(test_clock()),
        Arc::new(SequentialReferenceGenerator::new()),
        handle,
        BookingConfig::default(),
    );
    let state = AppState::new(
        engine.clone(),
        SeatQuery::new(Arc::clone(&ledger)),
        Arc::clone(&notifier),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state, None)).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket handshake");

    // The observer registers after the upgrade completes on the server side.
    tokio::time::timeout(Duration::from_secs(5), async {
        while notifier.observer_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("observer registered");

    let booked = seeded.seat_ids_for(&["A3", "A2"]);
    engine
        .create_booking(BookingRequest {
            customer: test_customer(),
            ticket_type: "standard".to_string(),
            seat_ids: booked.clone(),
        })
        .await
        .expect("booking");

    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("update within timeout")
        .expect("stream open")
        .expect("valid frame");
    let text = match frame {
        Message::Text(text) => text,
        other => unreachable!("expected a text frame, got {other:?}"),
    };
    let message: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(message["type"], "seat_update");
    let received: BTreeSet<SeatId> =
        serde_json::from_value(message["seatIds"].clone()).unwrap();
    assert_eq!(received, booked.into_iter().collect::<BTreeSet<_>>());

    let extra = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(extra.is_err(), "exactly one update per booking");

    socket.close(None).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while notifier.observer_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("observer removed after close");
}
