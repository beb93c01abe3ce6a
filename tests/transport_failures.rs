//! Transport failures never escape a call; they become result envelopes.

mod support;

use secure_rpc::{ApiResult, NetworkClient, NetworkOptions};
use serde_json::Value;
use std::io::Write;
use std::thread;
use std::time::Duration;
use support::MockServerFixture;

#[test]
fn slow_response_maps_to_network_timeout() {
    let mut fx = MockServerFixture::new();
    let _mock = fx
        .server
        .mock("GET", "/api/slow")
        .with_status(200)
        .with_chunked_body(|w| {
            thread::sleep(Duration::from_secs(3));
            w.write_all(br#"{"code":200}"#)
        })
        .create();
    let client = fx.client(NetworkOptions {
        read_timeout_secs: 1,
        write_timeout_secs: 1,
        ..Default::default()
    });

    let result: ApiResult<Value> = fx.endpoint(&client).get("slow").execute();

    assert_eq!(result.code, -100);
    assert_eq!(result.msg.as_deref(), Some("Network timeout"));
}

#[test]
fn refused_connection_maps_to_network_unreachable() {
    let fx = MockServerFixture::new();
    let client = fx.client(NetworkOptions {
        connect_timeout_secs: 2,
        ..Default::default()
    });

    let result: ApiResult<Value> = client
        .endpoint("http://127.0.0.1:1/api/")
        .unwrap()
        .get("anything")
        .execute();

    assert_eq!(result.code, -100);
    assert_eq!(result.msg.as_deref(), Some("Network unreachable"));
    assert!(!result.is_success());
}

#[test]
fn unknown_host_maps_to_network_unreachable() {
    let fx = MockServerFixture::new();
    let client = fx.client(NetworkOptions {
        connect_timeout_secs: 5,
        ..Default::default()
    });

    let result: ApiResult<Value> = client
        .endpoint("http://no-such-host.invalid/api/")
        .unwrap()
        .post("login")
        .json(&serde_json::json!({"name": "alice"}))
        .execute();

    assert_eq!(result.code, -100);
    assert_eq!(result.msg.as_deref(), Some("Network unreachable"));
    assert!(result.data().is_none());
}

#[test]
fn invalid_request_becomes_service_error() {
    let fx = MockServerFixture::new();
    let client = fx.client(NetworkOptions::default());

    let result: ApiResult<Value> = fx
        .endpoint(&client)
        .get("ping")
        .header("bad header", "x")
        .execute();

    assert_eq!(result.code, 500);
    assert!(result.msg.unwrap().contains("invalid header"));
}

#[test]
fn invalid_base_url_is_rejected_up_front() {
    let client: NetworkClient = MockServerFixture::new().client(NetworkOptions::default());
    assert!(client.endpoint("not a url").is_err());
}

#[test]
fn invalid_options_fail_the_build() {
    let fx = MockServerFixture::new();
    let built = fx
        .builder(NetworkOptions {
            connect_timeout_secs: 0,
            ..Default::default()
        })
        .build();
    assert!(built.is_err());
}
