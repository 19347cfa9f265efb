use std::time::Duration;

use wojak::{KvClient, RedisConfig, StatusCode, StoredValue};

fn unreachable_config() -> RedisConfig {
    // Bind and drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    RedisConfig {
        port,
        timeout: Duration::from_millis(200),
        ..RedisConfig::default()
    }
}

#[test]
fn test_unreachable_store() {
    let client = KvClient::connect(&unreachable_config()).unwrap();

    let set = client.set("foo", "bar");
    assert_eq!(set.status(), StatusCode::StoreError);
    assert!(set.comment().unwrap().starts_with("Unexpected store error"));

    let set = client.set("foo", StoredValue::record([("hard", "bar")]));
    assert_eq!(set.status(), StatusCode::StoreError);

    assert_eq!(client.delete("foo").status(), StatusCode::StoreError);

    // Probe faults read as absence.
    assert_eq!(client.get("foo").status(), StatusCode::ItemNotFound);
}

/// Needs a Redis server on 127.0.0.1:6379.
#[test]
#[ignore]
fn test_live_round_trip() {
    let client = KvClient::connect(&RedisConfig::default()).unwrap();
    let key = "wojak:test:live";
    client.delete(key);
    client.delete(key);

    assert_eq!(client.get(key).status(), StatusCode::ItemNotFound);
    assert!(client.set(key, "bar").is_ok());
    assert_eq!(client.get(key).into_content(), Some(StoredValue::scalar("bar")));

    assert!(client.set(key, StoredValue::record([("hard", "bar")])).is_ok());
    assert!(client.set(key, StoredValue::record([("easy", "bar")])).is_ok());
    assert_eq!(
        client.get(key).into_content(),
        Some(StoredValue::record([("easy", "bar")]))
    );

    assert!(client.delete(key).is_ok());
    assert_eq!(client.get(key).status(), StatusCode::ItemNotFound);
    assert_eq!(client.delete(key).status(), StatusCode::ItemNotFound);
}
