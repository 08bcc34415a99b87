//! Configuration integration tests

use tick::config::Config;

#[test]
fn test_example_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.ingest.products, vec!["BTC-USD", "ETH-USD", "LTC-USD"]);
    assert_eq!(config.ingest.interval_secs, 60);
    assert_eq!(config.ingest.granularity_secs, 10);
    assert_eq!(config.influx.database, "rates");
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ingest]\ninterval_secs = 0\n").unwrap();

    assert!(Config::load(&path).is_err());
}
