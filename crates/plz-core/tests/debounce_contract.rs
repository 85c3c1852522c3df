//! Contract Test: Debounced Triggering
//!
//! Constraints verified:
//! - Visible values update immediately, only lookups are debounced
//! - A burst of edits issues one lookup, for the final value
//! - Each field has its own timer

mod common;

use common::*;

#[tokio::test(start_paused = true)]
async fn typing_burst_issues_one_lookup_for_final_value() {
    let service = MockLookupService::new().with_name("Berlin", records(&[("10115", "Berlin")]));
    let harness = Harness::start(&service);

    for prefix in ["B", "Be", "Ber", "Berl", "Berli", "Berlin"] {
        harness.handle.set_locality(prefix).await.unwrap();
        wait_ms(200).await;
    }

    // Last edit was 200ms ago: nothing has settled yet
    assert_eq!(service.name_call_count(), 0);

    wait_ms(SETTLE_MS).await;
    assert_eq!(service.name_queries(), vec!["Berlin".to_string()]);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn visible_value_is_not_debounced() {
    let service = MockLookupService::new();
    let harness = Harness::start(&service);

    harness.handle.set_locality("Ber").await.unwrap();
    wait_ms(1).await;

    let state = harness.handle.state();
    assert_eq!(state.locality, "Ber");
    assert!(!state.locality_loading);
    assert_eq!(service.name_call_count(), 0);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn fields_settle_independently() {
    let service = MockLookupService::new();
    let harness = Harness::start(&service);

    harness.handle.set_locality("Atlantis").await.unwrap();
    wait_ms(500).await;
    harness.handle.set_postal_code("80331").await.unwrap();

    // The postal code edit did not push back the locality timer
    wait_ms(600).await;
    assert_eq!(service.name_queries(), vec!["Atlantis".to_string()]);
    assert_eq!(service.postal_code_call_count(), 0);

    wait_ms(500).await;
    assert_eq!(service.postal_code_queries(), vec!["80331".to_string()]);

    harness.stop().await;
}
