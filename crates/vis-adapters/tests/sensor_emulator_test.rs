//! Integration tests for the sensor emulator adapter.
//!
//! A wiremock server plays the emulator; the adapter polls it and forwards
//! attribute writes to it.

use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vis_adapters::sensor_emulator::{ATTRIBUTES, NAME};
use vis_adapters::{AdapterError, DataAdapter, DataMap, SensorEmulatorAdapter};
use vis_core::TryRecvError;

const UPDATE_PERIOD_MS: u64 = 50;

fn data(pairs: &[(&str, serde_json::Value)]) -> DataMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// Serve `/stats` with the given body, `times` times (forever when None).
async fn mount_stats(server: &MockServer, body: serde_json::Value, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body));
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

async fn create_adapter(server: &MockServer) -> SensorEmulatorAdapter {
    SensorEmulatorAdapter::new(&json!({
        "SensorURL": server.uri(),
        "UpdatePeriod": UPDATE_PERIOD_MS,
    }))
    .await
    .expect("Can't create adapter")
}

#[tokio::test]
async fn test_initial_paths() {
    let server = MockServer::start().await;
    mount_stats(
        &server,
        json!({ "speed": 42, "gps": { "lat": 50.45, "long": 30.52 } }),
        None,
    )
    .await;

    let adapter = create_adapter(&server).await;

    assert_eq!(adapter.name(), NAME);
    assert_eq!(
        adapter.update_period(),
        Duration::from_millis(UPDATE_PERIOD_MS)
    );

    let mut list = adapter.path_list().unwrap();
    list.sort();
    let mut expected: Vec<String> = ATTRIBUTES
        .iter()
        .map(|a| format!("Attribute.Emulator.{a}"))
        .chain(paths(&[
            "Signal.Emulator.speed",
            "Signal.Emulator.gps.lat",
            "Signal.Emulator.gps.long",
        ]))
        .collect();
    expected.sort();
    assert_eq!(list, expected);

    let values = adapter
        .get_data(&paths(&["Signal.Emulator.gps.lat", "Attribute.Emulator.stop"]))
        .unwrap();
    assert_eq!(
        values,
        data(&[
            ("Signal.Emulator.gps.lat", json!(50.45)),
            ("Attribute.Emulator.stop", serde_json::Value::Null),
        ])
    );

    assert_eq!(adapter.is_path_public("Signal.Emulator.speed"), Ok(true));

    adapter.close().await;
}

#[tokio::test]
async fn test_construction_fails_without_emulator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = SensorEmulatorAdapter::new(&json!({ "SensorURL": server.uri() }))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::UpstreamIo(_)), "got {err:?}");
}

#[tokio::test]
async fn test_set_attribute() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 42 }), None).await;
    Mock::given(method("POST"))
        .and(path("/attributes/"))
        .and(body_json(json!({ "stop": true })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();
    adapter
        .subscribe(&paths(&["Attribute.Emulator.stop"]))
        .unwrap();

    adapter
        .set_data(data(&[("Attribute.Emulator.stop", json!(true))]))
        .await
        .unwrap();

    let changes = timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("Wait data change timeout")
        .expect("Channel closed");
    assert_eq!(changes, data(&[("Attribute.Emulator.stop", json!(true))]));

    assert_eq!(
        adapter
            .get_data(&paths(&["Attribute.Emulator.stop"]))
            .unwrap(),
        data(&[("Attribute.Emulator.stop", json!(true))])
    );

    adapter.close().await;
}

#[tokio::test]
async fn test_rejected_write_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 42 }), None).await;
    Mock::given(method("POST"))
        .and(path("/attributes/"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let adapter = create_adapter(&server).await;

    let err = adapter
        .set_data(data(&[("Attribute.Emulator.to_rectangle", json!(true))]))
        .await
        .unwrap_err();

    assert_eq!(err, AdapterError::UpstreamRejected("400 Bad Request".to_string()));
    assert_eq!(
        adapter
            .get_data(&paths(&["Attribute.Emulator.to_rectangle"]))
            .unwrap()["Attribute.Emulator.to_rectangle"],
        serde_json::Value::Null
    );

    adapter.close().await;
}

#[tokio::test]
async fn test_write_outside_attribute_namespace() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 42 }), None).await;
    Mock::given(method("POST"))
        .and(path("/attributes/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = create_adapter(&server).await;

    let err = adapter
        .set_data(data(&[
            ("Attribute.Emulator.stop", json!(true)),
            ("Foo.bar", json!(1)),
        ]))
        .await
        .unwrap_err();
    assert_eq!(err, AdapterError::UnsupportedPath("Foo.bar".to_string()));

    // Signals are read-only.
    let err = adapter
        .set_data(data(&[("Signal.Emulator.speed", json!(1))]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AdapterError::UnsupportedPath("Signal.Emulator.speed".to_string())
    );

    // Inside the namespace but not a known attribute.
    let err = adapter
        .set_data(data(&[("Attribute.Emulator.turbo", json!(1))]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AdapterError::PathNotFound("Attribute.Emulator.turbo".to_string())
    );

    adapter.close().await;
}

#[tokio::test]
async fn test_refresh_notifies_subscribed_change() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 10, "rpm": 900 }), Some(1)).await;
    mount_stats(&server, json!({ "speed": 20, "rpm": 1000 }), None).await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();
    adapter.subscribe(&paths(&["Signal.Emulator.speed"])).unwrap();

    let changes = timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("Wait data change timeout")
        .expect("Channel closed");
    assert_eq!(changes, data(&[("Signal.Emulator.speed", json!(20))]));

    // Further polls return the same document: nothing more to report.
    tokio::time::sleep(Duration::from_millis(UPDATE_PERIOD_MS * 4)).await;
    assert_eq!(channel.try_recv(), Err(TryRecvError::Empty));

    adapter.close().await;
}

#[tokio::test]
async fn test_refresh_survives_upstream_failure() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 10 }), Some(1)).await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{broken"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_stats(&server, json!({ "speed": 30 }), None).await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();
    adapter.subscribe(&paths(&["Signal.Emulator.speed"])).unwrap();

    let changes = timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("Wait data change timeout")
        .expect("Channel closed");
    assert_eq!(changes, data(&[("Signal.Emulator.speed", json!(30))]));

    adapter.close().await;
}

#[tokio::test]
async fn test_refresh_survives_unknown_upstream_path() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 1 }), Some(1)).await;
    // Paths are fixed at construction; a document with a new one is refused whole.
    mount_stats(&server, json!({ "speed": 2, "rpm": 900 }), Some(2)).await;
    mount_stats(&server, json!({ "speed": 3 }), None).await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();
    adapter.subscribe(&paths(&["Signal.Emulator.speed"])).unwrap();

    let changes = timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("Wait data change timeout")
        .expect("Channel closed");
    assert_eq!(changes, data(&[("Signal.Emulator.speed", json!(3))]));
    assert!(!adapter
        .path_list()
        .unwrap()
        .contains(&"Signal.Emulator.rpm".to_string()));

    adapter.close().await;
}

#[tokio::test]
async fn test_unsubscribe_all_stops_notifications() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 10 }), Some(1)).await;
    mount_stats(&server, json!({ "speed": 20 }), None).await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();
    adapter.subscribe(&paths(&["Signal.Emulator.speed"])).unwrap();
    adapter.unsubscribe_all().unwrap();

    tokio::time::sleep(Duration::from_millis(UPDATE_PERIOD_MS * 4)).await;
    assert_eq!(channel.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(
        adapter.get_data(&paths(&["Signal.Emulator.speed"])).unwrap()["Signal.Emulator.speed"],
        json!(20)
    );

    adapter.close().await;
}

#[tokio::test]
async fn test_close_stops_refresh() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 10 }), None).await;

    let adapter = create_adapter(&server).await;
    let channel = adapter.subscribe_channel();

    adapter.close().await;

    let closed = timeout(Duration::from_secs(1), channel.recv())
        .await
        .expect("recv should return once closed");
    assert_eq!(closed, None);

    let polled = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(UPDATE_PERIOD_MS * 4)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), polled);

    // Closing twice is harmless.
    adapter.close().await;
}

#[tokio::test]
async fn test_close_during_poll_starts_no_new_fetch() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "speed": 10 }), Some(1)).await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "speed": 20 }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let adapter = create_adapter(&server).await;

    // First refresh tick fires after one period; its reply is held back.
    tokio::time::sleep(Duration::from_millis(UPDATE_PERIOD_MS * 2)).await;
    let before = server.received_requests().await.unwrap().len();
    assert_eq!(before, 2);

    timeout(Duration::from_secs(2), adapter.close())
        .await
        .expect("close should only wait for the poll in flight");

    assert_eq!(server.received_requests().await.unwrap().len(), before);
    // The reply that arrived after close was not committed.
    assert_eq!(
        adapter.get_data(&paths(&["Signal.Emulator.speed"])).unwrap()["Signal.Emulator.speed"],
        json!(10)
    );
}
