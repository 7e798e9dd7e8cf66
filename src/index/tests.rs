use super::*;
use tempfile::TempDir;

#[test]
fn add_and_search() {
    let mut index = FlatIpIndex::new(3);

    index.add(&[1.0, 0.0, 0.0]).expect("should add");
    index.add(&[0.9, 0.1, 0.0]).expect("should add");
    index.add(&[0.0, 1.0, 0.0]).expect("should add");

    assert_eq!(index.len(), 3);

    let results = index.search(&[1.0, 0.0, 0.0], 2).expect("should search");
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].0, 0);
    assert!((results[0].1 - 1.0).abs() < 1e-6);

    assert_eq!(results[1].0, 1);
    assert!(results[1].1 > 0.85);
}

#[test]
fn dimension_mismatch() {
    let mut index = FlatIpIndex::new(3);
    assert!(index.add(&[1.0, 0.0]).is_err());

    index.add(&[1.0, 0.0, 0.0]).expect("should add");
    assert!(index.search(&[1.0, 0.0], 1).is_err());
    assert!(index.update(0, &[1.0]).is_err());
}

#[test]
fn empty_index_search_returns_empty() {
    let index = FlatIpIndex::new(4);
    let results = index
        .search(&[1.0, 0.0, 0.0, 0.0], 10)
        .expect("should search");
    assert!(results.is_empty());
}

#[test]
fn k_larger_than_len_returns_all() {
    let mut index = FlatIpIndex::new(2);
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[0.0, 1.0]).expect("should add");

    let results = index.search(&[1.0, 0.0], 50).expect("should search");
    assert_eq!(results.len(), 2);
}

#[test]
fn ties_break_by_insertion_order() {
    let mut index = FlatIpIndex::new(2);
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[1.0, 0.0]).expect("should add");

    let results = index.search(&[1.0, 0.0], 3).expect("should search");
    let slots: Vec<usize> = results.iter().map(|(slot, _)| *slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn update_replaces_vector_in_place() {
    let mut index = FlatIpIndex::new(2);
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[0.0, 1.0]).expect("should add");

    index.update(0, &[0.0, 1.0]).expect("should update");

    let results = index.search(&[0.0, 1.0], 2).expect("should search");
    assert_eq!(results.len(), 2);
    assert!((results[0].1 - 1.0).abs() < 1e-6);
    assert!((results[1].1 - 1.0).abs() < 1e-6);

    assert!(index.update(5, &[1.0, 0.0]).is_err());
}

#[test]
fn remove_compacts_surviving_slots() {
    let mut index = FlatIpIndex::new(2);
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[0.0, 1.0]).expect("should add");
    index.add(&[-1.0, 0.0]).expect("should add");

    index.remove(&[1]);
    assert_eq!(index.len(), 2);

    // Slot 2 shifted down to slot 1.
    let results = index.search(&[-1.0, 0.0], 1).expect("should search");
    assert_eq!(results[0].0, 1);
    assert!((results[0].1 - 1.0).abs() < 1e-6);
}

#[test]
fn remove_ignores_out_of_range_and_duplicates() {
    let mut index = FlatIpIndex::new(2);
    index.add(&[1.0, 0.0]).expect("should add");
    index.add(&[0.0, 1.0]).expect("should add");

    index.remove(&[0, 0, 17]);
    assert_eq!(index.len(), 1);

    index.remove(&[]);
    assert_eq!(index.len(), 1);
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let mut index = FlatIpIndex::new(3);
    index.add(&[1.0, 0.0, 0.0]).expect("should add");
    index.add(&[0.0, 0.7, 0.3]).expect("should add");
    index.save(&path).expect("should save");

    let loaded = FlatIpIndex::load(&path).expect("should load");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.dimension(), 3);

    let before = index.search(&[1.0, 0.0, 0.0], 2).expect("should search");
    let after = loaded.search(&[1.0, 0.0, 0.0], 2).expect("should search");
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.0, a.0);
        assert!((b.1 - a.1).abs() < 1e-6);
    }
}

#[test]
fn load_rejects_garbage() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    std::fs::write(&path, b"definitely not an index").expect("should write file");

    assert!(FlatIpIndex::load(&path).is_err());
}

#[test]
fn load_missing_file_is_an_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    assert!(FlatIpIndex::load(temp_dir.path().join("absent.bin")).is_err());
}
