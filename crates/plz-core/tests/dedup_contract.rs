//! Contract Test: Request Deduplication
//!
//! Constraints verified:
//! - A value written by a reciprocal lookup does not trigger a lookup back
//! - A manual edit always earns a fresh lookup, even for a known value
//! - Blank values clear transient state without calling the service
//! - Surrounding whitespace never produces a second identical request

mod common;

use common::*;
use plz_core::{Direction, EngineEvent, SkipReason};

#[tokio::test(start_paused = true)]
async fn reverse_resolution_does_not_bounce_back() {
    let service =
        MockLookupService::new().with_postal_code("10115", records(&[("10115", "Berlin")]));
    let harness = Harness::start(&service);

    harness.handle.set_postal_code("10115").await.unwrap();
    wait_ms(SETTLE_MS).await;
    assert_eq!(harness.handle.state().locality, "Berlin");

    // The locality now settles on the value the lookup just wrote
    wait_ms(2 * DEBOUNCE_MS).await;
    assert_eq!(service.name_call_count(), 0);
    assert_eq!(service.postal_code_call_count(), 1);

    let events = harness.stop().await;
    assert_eq!(
        count(&events, |e| matches!(
            e,
            EngineEvent::LookupSkipped {
                direction: Direction::Locality,
                reason: SkipReason::Duplicate,
                ..
            }
        )),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn manual_edit_forces_fresh_lookup() {
    let service = MockLookupService::new().with_name("Berlin", records(&[("10115", "Berlin")]));
    let harness = Harness::start(&service);

    harness.handle.set_locality("Berlin").await.unwrap();
    wait_ms(SETTLE_MS).await;
    assert_eq!(service.name_call_count(), 1);

    // Backspace and retype the same name
    harness.handle.set_locality("Berli").await.unwrap();
    wait_ms(100).await;
    harness.handle.set_locality("Berlin").await.unwrap();
    wait_ms(SETTLE_MS).await;

    assert_eq!(
        service.name_queries(),
        vec!["Berlin".to_string(), "Berlin".to_string()]
    );
    assert_eq!(harness.handle.state().postal_code, "10115");

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn blank_settle_clears_candidates_without_lookup() {
    let service = MockLookupService::new().with_name(
        "München",
        records(&[("80331", "München"), ("80333", "München")]),
    );
    let harness = Harness::start(&service);

    harness.handle.set_locality("München").await.unwrap();
    wait_ms(SETTLE_MS).await;
    assert!(harness.handle.state().show_candidates);

    harness.handle.set_locality("").await.unwrap();
    wait_ms(SETTLE_MS).await;

    let state = harness.handle.state();
    assert!(state.candidates.is_empty());
    assert!(!state.show_candidates);
    assert!(state.locality_error.is_empty());
    assert_eq!(service.name_call_count(), 1);

    let events = harness.stop().await;
    assert_eq!(
        count(&events, |e| matches!(
            e,
            EngineEvent::LookupSkipped {
                direction: Direction::Locality,
                reason: SkipReason::Blank,
                ..
            }
        )),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn padded_value_is_queried_trimmed() {
    let service = MockLookupService::new().with_name("Berlin", records(&[("10115", "Berlin")]));
    let harness = Harness::start(&service);

    harness.handle.set_locality("  Berlin ").await.unwrap();
    wait_ms(SETTLE_MS).await;

    let state = harness.handle.state();
    assert_eq!(state.locality, "  Berlin ");
    assert_eq!(state.postal_code, "10115");
    assert_eq!(service.name_queries(), vec!["Berlin".to_string()]);

    // The written postal code settles against the recorded reference
    wait_ms(2 * DEBOUNCE_MS).await;
    assert_eq!(service.name_call_count(), 1);
    assert_eq!(service.postal_code_call_count(), 0);

    let events = harness.stop().await;
    assert!(events.contains(&EngineEvent::LookupIssued {
        direction: Direction::Locality,
        query: "Berlin".to_string(),
    }));
}
