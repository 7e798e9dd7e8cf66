#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests of the retrieval subsystem: store/index alignment,
// dedup semantics, persistence, and search boundaries.

use tempfile::TempDir;

use neptune_ai::embeddings::HashingEncoder;
use neptune_ai::retrieval::{ProfileRecord, RetrievalService, SearchOptions};
use neptune_ai::store::{DocMetadata, ProfileMetadata};

fn open_service(dir: &std::path::Path) -> RetrievalService {
    RetrievalService::open(Box::new(HashingEncoder::new(384)), dir)
        .expect("should open retrieval service")
}

fn profile_metadata(temperature: f64) -> DocMetadata {
    DocMetadata::Profile(ProfileMetadata {
        temperature: Some(temperature),
        ..ProfileMetadata::default()
    })
}

/// The store and the index must stay the same size through any sequence of
/// adds, updates, and deletes.
#[test]
fn store_and_index_stay_aligned() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let mut ids = Vec::new();
    for i in 0..10 {
        let id = service
            .add_document(&format!("document number {}", i), profile_metadata(20.0))
            .expect("should add document");
        ids.push(id);

        let stats = service.get_stats();
        assert_eq!(stats.total_documents, stats.index_size);
    }

    // Re-add half of them (updates), delete a few, interleaved.
    for i in (0..10).step_by(2) {
        service
            .add_document(&format!("document number {}", i), profile_metadata(99.0))
            .expect("should update document");
        let stats = service.get_stats();
        assert_eq!(stats.total_documents, stats.index_size);
    }

    for id in ids.iter().take(4) {
        assert!(service.delete_document(id));
        let stats = service.get_stats();
        assert_eq!(stats.total_documents, stats.index_size);
    }

    assert_eq!(service.len(), 6);
}

/// Upserting the same content twice keeps one record carrying the second
/// metadata, at an unchanged document count.
#[test]
fn upsert_is_idempotent() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    service
        .add_document("other document", profile_metadata(1.0))
        .expect("should add document");

    let id_a = service
        .add_document("shared content", profile_metadata(25.0))
        .expect("should add document");
    let count_before = service.len();

    let id_b = service
        .add_document("shared content", profile_metadata(30.0))
        .expect("should update document");

    assert_eq!(id_a, id_b);
    assert_eq!(service.len(), count_before);

    let record = service.get_document(&id_a).expect("record exists");
    assert_eq!(
        record.metadata.as_profile().and_then(|p| p.temperature),
        Some(30.0)
    );
}

/// A saved store reloaded into a fresh instance returns the same top-k ids
/// with scores equal within floating-point tolerance.
#[test]
fn persistence_round_trip_preserves_search_results() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let records: Vec<ProfileRecord> = (0..8)
        .map(|i| ProfileRecord {
            latitude: Some(5.0 + f64::from(i)),
            longitude: Some(75.0 + f64::from(i)),
            temperature: Some(28.0 - f64::from(i)),
            ..ProfileRecord::default()
        })
        .collect();
    service
        .add_profile_batch(&records)
        .expect("should add profiles");
    service.save().expect("should save");

    let before = service
        .search("temperature near 7N 77E", &SearchOptions::with_k(5))
        .expect("should search");

    let reloaded = open_service(temp_dir.path());
    assert_eq!(reloaded.len(), 8);

    let after = reloaded
        .search("temperature near 7N 77E", &SearchOptions::with_k(5))
        .expect("should search");

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.record.id, a.record.id);
        assert!((b.similarity_score - a.similarity_score).abs() <= 1e-6);
    }
}

/// `k` larger than the document count returns everything; an empty store
/// returns nothing; neither errors.
#[test]
fn search_boundaries() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let empty = service
        .search("anything", &SearchOptions::with_k(10))
        .expect("empty search should not error");
    assert_eq!(empty.len(), 0);

    service
        .add_profile_batch(&[
            ProfileRecord {
                temperature: Some(25.0),
                ..ProfileRecord::default()
            },
            ProfileRecord {
                temperature: Some(18.0),
                ..ProfileRecord::default()
            },
        ])
        .expect("should add profiles");

    let results = service
        .search("temperature", &SearchOptions::with_k(100))
        .expect("should search");
    assert_eq!(results.len(), 2);
}

/// The near-duplicate ranks next to its twin, ahead of the textually
/// distant document.
#[test]
fn near_duplicate_ranking() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let id_first = service
        .add_document(
            "Location: 10.00°N, 80.00°E | Temperature: 25.00",
            profile_metadata(25.0),
        )
        .expect("should add document");
    let id_far = service
        .add_document(
            "Location: 20.00°N, 90.00°E | Temperature: 18.00",
            profile_metadata(18.0),
        )
        .expect("should add document");
    let id_near_dup = service
        .add_document(
            "Location: 10.01°N, 80.01°E | Temperature: 25.10",
            profile_metadata(25.1),
        )
        .expect("should add document");

    let results = service
        .search("ocean temperature near 10N 80E", &SearchOptions::with_k(2))
        .expect("should search");

    assert_eq!(results.len(), 2);
    let top_ids: Vec<&str> = results.iter().map(|r| r.record.id.as_str()).collect();
    assert!(top_ids.contains(&id_first.as_str()));
    assert!(top_ids.contains(&id_near_dup.as_str()));
    assert!(!top_ids.contains(&id_far.as_str()));
}

/// Deleting a middle slot from a 5-document store leaves 4 searchable
/// documents, none of them the deleted one.
#[test]
fn delete_middle_slot() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(
            service
                .add_document(&format!("profile measurement {}", i), profile_metadata(20.0))
                .expect("should add document"),
        );
    }

    assert!(service.delete_document(&ids[2]));

    let results = service
        .search("profile measurement", &SearchOptions::with_k(5))
        .expect("should search");

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.record.id != ids[2]));
    for id in [&ids[0], &ids[1], &ids[3], &ids[4]] {
        assert!(results.iter().any(|r| r.record.id == **id));
    }
}

/// Persisted files survive a delete-then-save cycle with the slot mapping
/// intact.
#[test]
fn save_after_delete_reloads_consistently() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut service = open_service(temp_dir.path());

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(
            service
                .add_document(&format!("record {}", i), profile_metadata(f64::from(i)))
                .expect("should add document"),
        );
    }
    service.delete_document(&ids[1]);
    service.save().expect("should save");

    let reloaded = open_service(temp_dir.path());
    assert_eq!(reloaded.len(), 3);
    assert!(reloaded.get_document(&ids[1]).is_none());
    assert!(reloaded.get_document(&ids[0]).is_some());
    assert!(reloaded.get_document(&ids[3]).is_some());

    let stats = reloaded.get_stats();
    assert_eq!(stats.total_documents, stats.index_size);
}
