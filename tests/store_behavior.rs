//! Behavior-driven tests for the tick store
//!
//! These tests verify how registration, appends and reads behave from the
//! point of view of an ingestion or query caller.

use std::sync::Arc;

use serde_json::json;
use tickstore_core::{
    CompanyProfile, DailyMetrics, IngestTuple, LiveQuote, PeriodSnapshot, StoreError, TickStore,
    TickerId, Tier, TierPayload, UtcDateTime, ValidationError,
};

fn ts(value: &str) -> UtcDateTime {
    UtcDateTime::parse(value).expect("valid timestamp")
}

fn live(price: f64) -> TierPayload {
    TierPayload::Live(LiveQuote {
        price,
        change: None,
        percent_change: None,
    })
}

fn price_of(payload: &TierPayload) -> f64 {
    match payload {
        TierPayload::Live(quote) => quote.price,
        other => panic!("expected live payload, got {other:?}"),
    }
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn when_a_symbol_is_seen_twice_it_resolves_to_the_same_ticker() {
    // Given: An empty store
    let store = TickStore::in_memory();

    // When: The same symbol is resolved in different spellings
    let first = store.resolve_or_create("AAPL").expect("register");
    let second = store.resolve_or_create("aapl").expect("resolve");

    // Then: Both resolve to one ticker
    assert_eq!(first, second);
    assert_eq!(first, TickerId::new(1));
    assert_eq!(store.registry().len(), 1);
    assert_eq!(store.resolve("AAPL").expect("resolve").id, first);
}

#[test]
fn when_a_symbol_is_malformed_nothing_is_registered() {
    // Given: An empty store
    let store = TickStore::in_memory();

    // When: Malformed symbols are registered
    for raw in ["", "TOOLONGSYMBOL", "1ABC", "AB CD"] {
        let error = store.resolve_or_create(raw).expect_err("must reject");

        // Then: Each is rejected as an invalid symbol
        assert_eq!(error.kind(), "invalid_symbol", "{raw:?}");
    }
    assert!(store.registry().is_empty());
}

// =============================================================================
// Series: Appends and Reads
// =============================================================================

#[test]
fn when_live_quotes_are_appended_latest_and_history_follow_time_order() {
    // Given: A registered ticker
    let store = TickStore::in_memory();
    let aapl = store.resolve_or_create("AAPL").expect("register");
    let t1 = ts("2026-02-20T15:30:00Z");
    let t2 = ts("2026-02-20T15:31:00Z");

    // When: Two quotes are appended in order
    store.append(aapl, t1, live(150.00)).expect("first append");
    let latest = store.latest("AAPL", Tier::Live).expect("read").expect("present");
    assert_eq!(price_of(&latest.payload), 150.00);
    assert_eq!(latest.observed_at, t1);

    store.append(aapl, t2, live(151.25)).expect("second append");

    // Then: Latest is the newest quote and history is ascending
    let latest = store.latest("AAPL", Tier::Live).expect("read").expect("present");
    assert_eq!(price_of(&latest.payload), 151.25);
    assert_eq!(latest.observed_at, t2);

    let history = store
        .history("AAPL", Tier::Live, ..)
        .expect("history")
        .map(|record| (price_of(&record.payload), record.observed_at))
        .collect::<Vec<_>>();
    assert_eq!(history, vec![(150.00, t1), (151.25, t2)]);

    // And: Re-appending the first timestamp fails without side effects
    let error = store.append(aapl, t1, live(149.00)).expect_err("out of order");
    assert!(matches!(error, StoreError::NonMonotonicTimestamp { .. }));
    let latest = store.latest("AAPL", Tier::Live).expect("read").expect("present");
    assert_eq!(price_of(&latest.payload), 151.25);
    assert_eq!(store.history("AAPL", Tier::Live, ..).expect("history").len(), 2);
}

#[test]
fn when_a_newer_quote_arrives_the_old_one_becomes_previous() {
    // Given: A ticker with two live quotes
    let store = TickStore::in_memory();
    let aapl = store.resolve_or_create("AAPL").expect("register");
    store
        .append(aapl, ts("2026-02-20T15:30:00Z"), live(150.0))
        .expect("append");
    store
        .append(aapl, ts("2026-02-20T15:31:00Z"), live(151.0))
        .expect("append");

    // When: The previous value is read
    let previous = store
        .previous("AAPL", Tier::Live)
        .expect("read")
        .expect("present");

    // Then: It is the second-most-recent record
    assert_eq!(price_of(&previous.payload), 150.0);
}

#[test]
fn when_history_is_ranged_only_matching_records_are_returned() {
    // Given: Five minute-spaced quotes
    let store = TickStore::in_memory();
    let aapl = store.resolve_or_create("AAPL").expect("register");
    for minute in 0u8..5 {
        store
            .append(
                aapl,
                ts(&format!("2026-02-20T15:0{minute}:00Z")),
                live(150.0 + f64::from(minute)),
            )
            .expect("append");
    }

    // When: A half-open range is queried
    let from = ts("2026-02-20T15:01:00Z");
    let to = ts("2026-02-20T15:04:00Z");
    let prices = store
        .history("AAPL", Tier::Live, from..to)
        .expect("history")
        .map(|record| price_of(&record.payload))
        .collect::<Vec<_>>();

    // Then: Only records in [from, to) are returned, oldest first
    assert_eq!(prices, vec![151.0, 152.0, 153.0]);

    // And: Each cursor is independent
    let mut cursor = store.history("AAPL", Tier::Live, from..).expect("history");
    let restarted = cursor.clone();
    cursor.next();
    assert_eq!(cursor.len(), 3);
    assert_eq!(restarted.len(), 4);
}

#[test]
fn when_tiers_are_appended_they_do_not_interfere() {
    // Given: A registered ticker
    let store = TickStore::in_memory();
    let aapl = store.resolve_or_create("AAPL").expect("register");
    let t = ts("2026-02-20T15:30:00Z");

    // When: Every tier receives a record at the same timestamp
    store.append(aapl, t, live(150.0)).expect("live");
    store
        .append(
            aapl,
            t,
            TierPayload::Frequent(PeriodSnapshot {
                open: 149.0,
                high: 151.0,
                low: 148.5,
                previous_close: Some(149.5),
                volume: Some(1_000_000),
            }),
        )
        .expect("frequent");
    store
        .append(
            aapl,
            t,
            TierPayload::Infrequent(DailyMetrics {
                market_cap: Some(2.9e12),
                trailing_pe: Some(29.1),
                forward_pe: None,
                dividend_yield: Some(0.005),
                analyst: None,
            }),
        )
        .expect("infrequent");
    store
        .append(
            aapl,
            t,
            TierPayload::General(CompanyProfile {
                long_name: Some(String::from("Apple Inc.")),
                sector: Some(String::from("Technology")),
                ..CompanyProfile::default()
            }),
        )
        .expect("general");

    // Then: Each tier has its own current value
    for tier in Tier::ALL {
        let latest = store.latest("AAPL", tier).expect("read").expect("present");
        assert_eq!(latest.tier(), tier);
    }
    assert_eq!(store.cache().len(), 4);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn when_a_ticker_is_unknown_appends_are_rejected() {
    // Given: An empty store
    let store = TickStore::in_memory();

    // When: Appending for an id that was never registered
    let error = store
        .append(TickerId::new(7), ts("2026-02-20T15:30:00Z"), live(1.0))
        .expect_err("must reject");

    // Then: The append fails as unknown ticker and nothing is cached
    assert!(matches!(error, StoreError::UnknownTicker(id) if id == TickerId::new(7)));
    assert!(store.cache().is_empty());
}

#[test]
fn when_a_payload_is_invalid_the_ticker_is_not_created() {
    // Given: An empty store
    let store = TickStore::in_memory();

    // When: A live tuple without a price is ingested
    let tuple: IngestTuple = serde_json::from_value(json!({
        "symbol": "NVDA",
        "tier": "live",
        "timestamp": "2026-02-20T15:30:00Z",
        "payload": { "change": 1.5 }
    }))
    .expect("tuple");
    let error = store.ingest(&tuple).expect_err("must reject");

    // Then: It fails as an invalid payload and NVDA stays unregistered
    assert!(matches!(
        error,
        StoreError::InvalidPayload {
            tier: Tier::Live,
            source: ValidationError::MissingField { field: "price" }
        }
    ));
    assert!(matches!(store.resolve("NVDA"), Err(StoreError::NotFound(_))));
}

#[test]
fn when_a_period_snapshot_is_inconsistent_it_is_rejected() {
    // Given: A registered ticker
    let store = TickStore::in_memory();
    let aapl = store.resolve_or_create("AAPL").expect("register");

    // When: high < low
    let error = store
        .append(
            aapl,
            ts("2026-02-20T15:30:00Z"),
            TierPayload::Frequent(PeriodSnapshot {
                open: 10.0,
                high: 9.0,
                low: 11.0,
                previous_close: None,
                volume: None,
            }),
        )
        .expect_err("must reject");

    // Then: The payload is invalid and the series stays empty
    assert_eq!(error.kind(), "invalid_payload");
    assert_eq!(store.series().len(aapl, Tier::Frequent), 0);
}

#[test]
fn when_reading_unknown_symbols_results_are_empty() {
    // Given: A store that only knows AAPL
    let store = Arc::new(TickStore::in_memory());
    store.resolve_or_create("AAPL").expect("register");

    // When/Then: Reads for other symbols are absent, not errors
    assert!(store.latest("MSFT", Tier::Live).expect("read").is_none());
    assert!(store.previous("MSFT", Tier::Live).expect("read").is_none());
    assert_eq!(store.history("MSFT", Tier::Live, ..).expect("read").len(), 0);
    assert!(store.latest("AAPL", Tier::General).expect("read").is_none());
}
