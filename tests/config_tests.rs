// tests/config_tests.rs
use easysetup_http_socket::config::{load_config, load_config_or_default, EndpointConfig};
use std::io::Write;
use std::net::Ipv4Addr;

#[tokio::test]
async fn loads_yaml_config() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "bind_address: 127.0.0.1\nport: 0\nnodelay: false\nkeepalive:\n  idle_secs: 30"
    )
    .unwrap();

    let config = load_config(file.path()).await.unwrap();
    assert_eq!(config.bind_address, Ipv4Addr::LOCALHOST);
    assert_eq!(config.port, 0);
    assert!(!config.nodelay);
    assert_eq!(config.keepalive.idle_secs, 30);
    assert_eq!(config.keepalive.interval_secs, 5);
}

#[tokio::test]
async fn loads_json_config() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"port": 9999, "receive_buffer_size": 4096}}"#).unwrap();

    let config = load_config(file.path()).await.unwrap();
    assert_eq!(config.port, 9999);
    assert_eq!(config.receive_buffer_size, 4096);
    assert_eq!(config.backlog, 1);
}

#[tokio::test]
async fn invalid_values_are_rejected() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(file, "keepalive:\n  retries: 0").unwrap();
    assert!(load_config(file.path()).await.is_err());
}

#[tokio::test]
async fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_or_default(dir.path().join("absent.yaml"))
        .await
        .unwrap();
    assert_eq!(config, EndpointConfig::default());
    assert!(load_config(dir.path().join("absent.yaml")).await.is_err());
}
