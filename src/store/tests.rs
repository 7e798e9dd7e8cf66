use super::*;
use tempfile::TempDir;

fn profile_metadata(latitude: f64) -> DocMetadata {
    DocMetadata::Profile(ProfileMetadata {
        latitude: Some(latitude),
        longitude: Some(80.0),
        temperature: Some(25.0),
        ..ProfileMetadata::default()
    })
}

fn summary_metadata(region: &str) -> DocMetadata {
    DocMetadata::Summary(SummaryMetadata {
        region: region.to_string(),
        profile_count: Some(42),
        source: None,
    })
}

#[test]
fn content_id_is_deterministic() {
    let a = content_id("some profile text");
    let b = content_id("some profile text");
    let c = content_id("different text");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
}

#[test]
fn upsert_appends_new_records_in_slot_order() {
    let mut store = DocumentStore::new();

    let (id_a, outcome_a) = store.upsert("first", profile_metadata(10.0));
    let (id_b, outcome_b) = store.upsert("second", profile_metadata(20.0));

    assert!(outcome_a.inserted);
    assert_eq!(outcome_a.slot, 0);
    assert!(outcome_b.inserted);
    assert_eq!(outcome_b.slot, 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.slot_of(&id_a), Some(0));
    assert_eq!(store.slot_of(&id_b), Some(1));
}

#[test]
fn upsert_same_content_updates_in_place() {
    let mut store = DocumentStore::new();

    let (id_first, _) = store.upsert("same content", profile_metadata(10.0));
    let created_at = store.get(&id_first).expect("record exists").created_at.clone();

    let (id_second, outcome) = store.upsert("same content", profile_metadata(99.0));

    assert_eq!(id_first, id_second);
    assert!(!outcome.inserted);
    assert_eq!(outcome.slot, 0);
    assert_eq!(store.len(), 1);

    let record = store.get(&id_first).expect("record exists");
    assert_eq!(
        record.metadata.as_profile().and_then(|p| p.latitude),
        Some(99.0)
    );
    assert_eq!(record.created_at, created_at);
}

#[test]
fn doc_type_follows_metadata_variant() {
    let mut store = DocumentStore::new();

    let (profile_id, _) = store.upsert("a profile", profile_metadata(10.0));
    let (summary_id, _) = store.upsert("a summary", summary_metadata("Indian Ocean"));

    assert_eq!(
        store.get(&profile_id).expect("record exists").doc_type,
        DocType::Profile
    );
    assert_eq!(
        store.get(&summary_id).expect("record exists").doc_type,
        DocType::Summary
    );
    assert_eq!(store.doc_types(), vec![DocType::Profile, DocType::Summary]);
}

#[test]
fn remove_rebuilds_slot_map() {
    let mut store = DocumentStore::new();

    let (id_a, _) = store.upsert("alpha", profile_metadata(1.0));
    let (id_b, _) = store.upsert("beta", profile_metadata(2.0));
    let (id_c, _) = store.upsert("gamma", profile_metadata(3.0));

    let freed = store.remove(&id_b);
    assert_eq!(freed, Some(1));
    assert_eq!(store.len(), 2);

    assert_eq!(store.slot_of(&id_a), Some(0));
    assert_eq!(store.slot_of(&id_c), Some(1));
    assert!(store.get(&id_b).is_none());
}

#[test]
fn remove_unknown_id_returns_none() {
    let mut store = DocumentStore::new();
    store.upsert("alpha", profile_metadata(1.0));

    assert_eq!(store.remove("no-such-id"), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("metadata.json");

    let mut store = DocumentStore::new();
    let (id_a, _) = store.upsert("alpha", profile_metadata(1.0));
    let (id_b, _) = store.upsert("summary text", summary_metadata("Arabian Sea"));
    store.save(&path).expect("should save");

    let loaded = DocumentStore::load(&path).expect("should load");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.slot_of(&id_a), Some(0));
    assert_eq!(loaded.slot_of(&id_b), Some(1));

    let summary = loaded.get(&id_b).expect("record exists");
    assert_eq!(summary.doc_type, DocType::Summary);
    assert_eq!(
        summary.metadata.as_summary().map(|s| s.region.as_str()),
        Some("Arabian Sea")
    );
}

#[test]
fn load_rejects_corrupt_json() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("metadata.json");
    std::fs::write(&path, "{not json").expect("should write file");

    assert!(DocumentStore::load(&path).is_err());
}

#[test]
fn metadata_variants_survive_serde() {
    let records = vec![
        DocumentRecord {
            id: content_id("p"),
            content: "p".to_string(),
            metadata: profile_metadata(12.5),
            doc_type: DocType::Profile,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        },
        DocumentRecord {
            id: content_id("s"),
            content: "s".to_string(),
            metadata: summary_metadata("Bay of Bengal"),
            doc_type: DocType::Summary,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        },
    ];

    let json = serde_json::to_string(&records).expect("should serialize");
    let parsed: Vec<DocumentRecord> = serde_json::from_str(&json).expect("should parse");

    assert_eq!(parsed, records);
    assert!(parsed[0].metadata.as_profile().is_some());
    assert!(parsed[1].metadata.as_summary().is_some());
}
