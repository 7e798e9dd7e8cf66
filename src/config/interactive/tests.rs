use super::load_existing_config as load_existing_config_impl;

#[test]
fn load_existing_config() {
    let config = load_existing_config_impl().expect("config loaded successfully");
    assert!(!config.encoder.host.is_empty());
    assert!(config.encoder.port > 0);
    assert!(!config.encoder.model.is_empty());
    assert!(config.encoder.dimension > 0);
    assert!(!config.llm.model.is_empty());
}
