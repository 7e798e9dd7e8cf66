use super::*;
use crate::embeddings::HashingEncoder;
use tempfile::TempDir;

async fn test_stores() -> (Database, RetrievalService, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("profiles.db"))
        .await
        .expect("should create database");
    let retrieval = RetrievalService::open(
        Box::new(HashingEncoder::new(128)),
        temp_dir.path().join("vector_index"),
    )
    .expect("should open retrieval service");
    (database, retrieval, temp_dir)
}

fn record(latitude: f64, temperature: f64) -> ProfileRecord {
    ProfileRecord {
        latitude: Some(latitude),
        longitude: Some(80.0),
        temperature: Some(temperature),
        region: Some("Indian Ocean".to_string()),
        month: Some("March".to_string()),
        ..ProfileRecord::default()
    }
}

#[test]
fn load_profiles_parses_json_array() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("profiles.json");
    std::fs::write(
        &path,
        r#"[
            {"latitude": 10.5, "longitude": 80.2, "temperature": 25.5, "region": "Indian Ocean"},
            {"platform_number": "2902746", "salinity": 35.1}
        ]"#,
    )
    .expect("should write ingest file");

    let records = load_profiles(&path).expect("should parse profiles");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].latitude, Some(10.5));
    assert_eq!(records[1].platform_number.as_deref(), Some("2902746"));
    assert_eq!(records[1].latitude, None);
}

#[test]
fn load_profiles_rejects_invalid_json() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{not an array").expect("should write file");

    assert!(load_profiles(&path).is_err());
    assert!(load_profiles(temp_dir.path().join("missing.json")).is_err());
}

#[tokio::test]
async fn run_populates_both_stores() {
    let (database, mut retrieval, _temp_dir) = test_stores().await;

    let records = vec![record(10.0, 25.0), record(11.0, 24.0), record(12.0, 23.0)];
    let report = run(&database, &mut retrieval, &records)
        .await
        .expect("should ingest records");

    assert_eq!(report.rows_inserted, 3);
    assert_eq!(report.documents_indexed, 3);
    assert_eq!(
        database.count_profiles().await.expect("should count"),
        3
    );
    assert_eq!(retrieval.len(), 3);

    let stats = retrieval.get_stats();
    assert_eq!(stats.total_documents, stats.index_size);
}

#[tokio::test]
async fn run_persists_the_vector_store() {
    let (database, mut retrieval, temp_dir) = test_stores().await;

    run(&database, &mut retrieval, &[record(10.0, 25.0)])
        .await
        .expect("should ingest records");

    let index_dir = temp_dir.path().join("vector_index");
    assert!(index_dir.join("metadata.json").exists());
    assert!(index_dir.join("vector_index.bin").exists());
}

#[tokio::test]
async fn duplicate_content_dedupes_on_the_vector_side() {
    let (database, mut retrieval, _temp_dir) = test_stores().await;

    // Same content string twice: two rows, one document.
    let records = vec![record(10.0, 25.0), record(10.0, 25.0)];
    let report = run(&database, &mut retrieval, &records)
        .await
        .expect("should ingest records");

    assert_eq!(report.rows_inserted, 2);
    assert_eq!(report.documents_indexed, 1);
    assert_eq!(
        database.count_profiles().await.expect("should count"),
        2
    );
}
