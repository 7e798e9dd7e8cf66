use super::*;

#[test]
fn normalize_produces_unit_length() {
    let mut vector = vec![3.0, 4.0];
    l2_normalize(&mut vector);

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-6);
    assert!((vector[0] - 0.6).abs() < 1e-6);
    assert!((vector[1] - 0.8).abs() < 1e-6);
}

#[test]
fn normalize_leaves_zero_vector_alone() {
    let mut vector = vec![0.0, 0.0, 0.0];
    l2_normalize(&mut vector);
    assert_eq!(vector, vec![0.0, 0.0, 0.0]);
}

#[test]
fn build_encoder_defaults_to_hashing() {
    let config = crate::config::Config::default();
    let encoder = build_encoder(&config).expect("should build hashing encoder");
    assert_eq!(encoder.dimension(), 384);
    assert_eq!(encoder.model_name(), "feature-hashing-v1");
}
