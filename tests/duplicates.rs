//! Duplicate detector set semantics against an in-memory index.

mod common;

use chrono::NaiveDate;

use common::FakeVectorIndex;
use newsvec::models::{DuplicateConfig, RecordMetadata};
use newsvec::services::{DateWindow, DuplicateDetector};
use newsvec::utils::date;

fn window() -> DateWindow {
    DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
    )
}

fn detector(threshold: f32) -> DuplicateDetector {
    DuplicateDetector::new(&DuplicateConfig {
        enabled: true,
        distance_threshold: threshold,
        ..Default::default()
    })
}

/// Seed a record at an exact dot-product distance from the `[1, 0, 0]`
/// query embedding, published on the given day.
fn seed_at(index: &FakeVectorIndex, url: &str, distance: f32, day: &str) {
    index.seed(
        url,
        vec![1.0 - distance, 0.0, 0.0],
        RecordMetadata {
            title: url.to_string(),
            url: url.to_string(),
            publish_date: date::day_timestamp(day).unwrap(),
        },
    );
}

const QUERY: [f32; 3] = [1.0, 0.0, 0.0];

#[tokio::test]
async fn returns_only_candidates_within_threshold() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/near", 0.05, "2024-03-04");
    seed_at(&index, "https://example.com/far", 0.2, "2024-03-04");

    let duplicates = detector(0.1)
        .find_duplicates(&index, &QUERY, window())
        .await;

    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].metadata.url, "https://example.com/near");
    assert!((duplicates[0].distance - 0.05).abs() < 1e-6);
}

#[tokio::test]
async fn threshold_comparison_is_inclusive() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/boundary", 0.5, "2024-03-04");

    let duplicates = detector(0.5)
        .find_duplicates(&index, &QUERY, window())
        .await;
    assert_eq!(duplicates.len(), 1);

    let duplicates = detector(0.49)
        .find_duplicates(&index, &QUERY, window())
        .await;
    assert!(duplicates.is_empty());
}

#[tokio::test]
async fn result_set_is_monotonic_in_threshold() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/a", 0.05, "2024-03-04");
    seed_at(&index, "https://example.com/b", 0.2, "2024-03-04");
    seed_at(&index, "https://example.com/c", 0.5, "2024-03-04");

    let mut previous: Vec<String> = Vec::new();
    for threshold in [0.1, 0.3, 1.0] {
        let urls: Vec<String> = detector(threshold)
            .find_duplicates(&index, &QUERY, window())
            .await
            .into_iter()
            .map(|c| c.metadata.url)
            .collect();

        // Raising the threshold never drops a previously-included candidate.
        for url in &previous {
            assert!(urls.contains(url), "{url} disappeared at T={threshold}");
        }
        assert!(urls.len() > previous.len());
        previous = urls;
    }
    assert_eq!(previous.len(), 3);
}

#[tokio::test]
async fn store_ranking_order_is_preserved() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/second", 0.25, "2024-03-04");
    seed_at(&index, "https://example.com/first", 0.05, "2024-03-04");
    seed_at(&index, "https://example.com/third", 0.375, "2024-03-04");

    let duplicates = detector(0.5)
        .find_duplicates(&index, &QUERY, window())
        .await;

    let urls: Vec<&str> = duplicates.iter().map(|c| c.metadata.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://example.com/first",
            "https://example.com/second",
            "https://example.com/third",
        ]
    );
}

#[tokio::test]
async fn window_bounds_are_inclusive_on_both_ends() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/on-start", 0.0, "2024-03-01");
    seed_at(&index, "https://example.com/on-end", 0.0, "2024-03-07");
    seed_at(&index, "https://example.com/before", 0.0, "2024-02-29");
    seed_at(&index, "https://example.com/after", 0.0, "2024-03-08");

    let duplicates = detector(0.1)
        .find_duplicates(&index, &QUERY, window())
        .await;

    let mut urls: Vec<&str> = duplicates.iter().map(|c| c.metadata.url.as_str()).collect();
    urls.sort_unstable();
    assert_eq!(
        urls,
        ["https://example.com/on-end", "https://example.com/on-start"]
    );
}

#[tokio::test]
async fn empty_when_nothing_qualifies() {
    let index = FakeVectorIndex::default();
    let duplicates = detector(0.1)
        .find_duplicates(&index, &QUERY, window())
        .await;
    assert!(duplicates.is_empty());
}

#[tokio::test]
async fn store_failure_is_fail_open() {
    let index = FakeVectorIndex::default();
    seed_at(&index, "https://example.com/near", 0.0, "2024-03-04");
    index.fail_searches();

    let duplicates = detector(0.1)
        .find_duplicates(&index, &QUERY, window())
        .await;
    assert!(duplicates.is_empty());

    // The failure was swallowed, not sticky: the next scan sees the record.
    let duplicates = detector(0.1)
        .find_duplicates(&index, &QUERY, window())
        .await;
    assert_eq!(duplicates.len(), 1);
}
