//! End-to-end batch runs through `ScrapeService`

mod common;

use common::*;
use listing_scraper::{ScrapeRequest, ScrapeService, SelectorConfig, SubmitError};
use std::sync::Arc;
use std::time::Duration;

fn service(driver: &ScriptedDriver, store: &Arc<RecordingStore>) -> Arc<ScrapeService> {
    ScrapeService::new(driver.clone().into_driver(), store.clone(), test_config())
}

fn three_listings() -> (ScriptedDriver, Arc<RecordingStore>, Vec<String>) {
    let driver = ScriptedDriver::new()
        .page(&listing_url("R1"), listing_page("R1"))
        .page(&listing_url("R2"), listing_page("R2"))
        .page(&listing_url("R3"), listing_page("R3"));
    let store = Arc::new(RecordingStore::with_listings(&["R1", "R2", "R3"]));
    let urls = vec![listing_url("R1"), listing_url("R2"), listing_url("R3")];
    (driver, store, urls)
}

#[tokio::test]
async fn clean_batch_saves_everything() {
    let (driver, store, urls) = three_listings();

    let summary = service(&driver, &store)
        .submit(request("clean", &urls))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.saved, 3);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.retried, 0);
    assert!(summary.final_failures.is_empty());
    assert!(store.recorded().is_empty());

    let update = store.update_for("R2").unwrap();
    assert_eq!(update.content, "Listing R2");
    assert_eq!(
        update.photos,
        vec!["https://cdn.homes.test/R2/1.jpg", "https://cdn.homes.test/R2/2.jpg"]
    );
}

#[tokio::test]
async fn transient_navigation_failure_recovers_on_retry() {
    let (driver, store, urls) = three_listings();
    let driver = driver.fail_navigation(&urls[1], 1);

    let summary = service(&driver, &store)
        .submit(request("retry-ok", &urls))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.retried, 1);
    assert!(summary.final_failures.is_empty());
    assert!(store.recorded().is_empty(), "no failure recording when retry succeeds");
    assert_eq!(driver.navigations_to(&urls[1]), 2);
    assert_eq!(
        driver.sessions_closed(),
        driver.sessions_opened(),
        "both pools shut down before the batch completes"
    );
}

#[tokio::test]
async fn persistent_navigation_failure_is_recorded() {
    let (driver, store, urls) = three_listings();
    let driver = driver.fail_navigation(&urls[1], 2);

    let summary = service(&driver, &store)
        .submit(request("retry-fails", &urls))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.retried, 1);
    assert_eq!(summary.final_failures, vec![urls[1].clone()]);
    assert_eq!(store.recorded(), vec![vec![urls[1].clone()]]);
    assert_eq!(driver.navigations_to(&urls[1]), 2, "retried exactly once");
}

#[tokio::test]
async fn unknown_reference_is_a_save_failure_without_retry() {
    let url = listing_url("GHOST");
    let driver = ScriptedDriver::new().page(&url, listing_page("GHOST"));
    let store = Arc::new(RecordingStore::with_listings(&["R1"]));

    let summary = service(&driver, &store)
        .submit(request("ghost", std::slice::from_ref(&url)))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.retried, 0);
    assert_eq!(driver.navigations_to(&url), 1);
    assert_eq!(store.recorded(), vec![vec![url]]);
}

#[tokio::test]
async fn unmatched_reference_pattern_hits_not_found() {
    let url = "https://homes.test/other/path".to_string();
    let driver = ScriptedDriver::new().page(&url, listing_page("X"));
    let store = Arc::new(RecordingStore::with_listings(&["R1"]));

    let summary = service(&driver, &store)
        .submit(request("no-ref", std::slice::from_ref(&url)))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.saved, 0);
    assert_eq!(summary.errors, 1);
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn recording_failure_does_not_change_counts() {
    let (driver, _, urls) = three_listings();
    let driver = driver.fail_navigation(&urls[0], 2);
    let store = Arc::new(RecordingStore::with_listings(&["R1", "R2", "R3"]).failing_recording());

    let service = service(&driver, &store);
    let summary = service
        .submit(request("advisory", &urls))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(store.recorded().len(), 1);
    assert!(!service.gate().is_running());
}

#[tokio::test]
async fn mixed_failures_are_all_recorded() {
    let driver = ScriptedDriver::new()
        .page(&listing_url("OK"), listing_page("OK"))
        .page(&listing_url("MISSING"), listing_page("MISSING"))
        .page(&listing_url("FLAKY"), listing_page("FLAKY"))
        .fail_navigation(&listing_url("FLAKY"), 1);
    let store = Arc::new(RecordingStore::with_listings(&["OK", "FLAKY"]));
    let urls = vec![
        listing_url("OK"),
        listing_url("MISSING"),
        listing_url("FLAKY"),
        listing_url("DEAD"),
    ];

    let summary = service(&driver, &store)
        .submit(request("mixed", &urls))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.retried, 2);
    assert_eq!(
        summary.final_failures,
        vec![listing_url("MISSING"), listing_url("DEAD")]
    );
    assert_eq!(store.recorded().len(), 1);
}

#[tokio::test]
async fn second_batch_rejected_while_first_runs() {
    let (driver, store, urls) = three_listings();
    let driver = driver.navigation_delay(Duration::from_millis(100));
    let service = service(&driver, &store);

    let first = service.submit(request("first", &urls)).await.unwrap();
    assert!(service.gate().is_running());

    let second = service.submit(request("second", &urls)).await;
    assert!(matches!(second, Err(SubmitError::Busy)));

    let summary = first.wait().await.unwrap();
    assert_eq!(summary.name, "first");
    assert_eq!(summary.saved, 3);
    assert_eq!(driver.navigations().len(), 3, "rejected batch scheduled nothing");

    assert!(!service.gate().is_running());
    let third = service.submit(request("third", &urls)).await.unwrap();
    assert_eq!(third.wait().await.unwrap().saved, 3);
}

#[tokio::test]
async fn invalid_submissions_leave_gate_idle() {
    let (driver, store, urls) = three_listings();
    let service = service(&driver, &store);

    let empty = service.submit(request("empty", &[])).await;
    assert!(matches!(empty, Err(SubmitError::EmptyUrls)));

    let no_selectors = service
        .submit(ScrapeRequest {
            name: "bare".into(),
            urls: urls.clone(),
            selectors: SelectorConfig {
                reference: REFERENCE.into(),
                ..SelectorConfig::default()
            },
        })
        .await;
    assert!(matches!(no_selectors, Err(SubmitError::NoSelectors)));

    assert!(!service.gate().is_running());
    assert!(driver.navigations().is_empty());
}

#[tokio::test]
async fn last_batch_visible_after_waiting_on_gate() {
    let (driver, store, urls) = three_listings();
    let driver = driver.navigation_delay(Duration::from_millis(30));
    let service = service(&driver, &store);

    let handle = service.submit(request("observed", &urls)).await.unwrap();
    let batch_id = handle.batch_id();

    service.gate().wait_idle().await;
    let last = service.last_batch().expect("summary stored before gate opens");
    assert_eq!(last.batch_id, batch_id);
    assert_eq!(last.saved, 3);
}
