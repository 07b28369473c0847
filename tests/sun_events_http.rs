// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the sun data client using wiremock.

#![cfg(feature = "sunevents")]

use std::time::Duration;

use virtual_accessories::config::SunEvent;
use virtual_accessories::error::ProtocolError;
use virtual_accessories::protocol::{RetryPolicy, SunEventsClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn body() -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "results": {
            "date": "2030-06-21",
            "sunrise": "5:46:52 AM",
            "sunset": "9:58:03 PM",
            "golden_hour": "9:07:21 PM",
            "timezone": "Europe/Paris",
            "utc_offset": 120
        }
    })
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_delay_step(Duration::from_millis(10))
}

#[tokio::test]
async fn fetches_solar_times() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lng", "2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = SunEventsClient::with_base_url(server.uri()).unwrap();
    let data = client.fetch("48.85", "2.35").await.unwrap();

    assert_eq!(data.sunset.as_deref(), Some("9:58:03 PM"));
    assert_eq!(data.event_time(SunEvent::GoldenHour), Some("9:07:21 PM"));
    assert_eq!(data.timezone, "Europe/Paris");
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = SunEventsClient::with_base_url(server.uri())
        .unwrap()
        .with_retry(fast_retry());
    let data = client.fetch("48.85", "2.35").await.unwrap();

    assert_eq!(data.sunrise.as_deref(), Some("5:46:52 AM"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SunEventsClient::with_base_url(server.uri())
        .unwrap()
        .with_retry(fast_retry());
    let result = client.fetch("48.85", "2.35").await;

    assert!(matches!(result, Err(ProtocolError::HttpStatus(500))));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "INVALID_REQUEST"
        })))
        .mount(&server)
        .await;

    let client = SunEventsClient::with_base_url(server.uri())
        .unwrap()
        .with_retry(fast_retry());
    let result = client.fetch("91", "2.35").await;

    assert!(matches!(result, Err(ProtocolError::UnexpectedResponse(_))));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = SunEventsClient::with_base_url(server.uri())
        .unwrap()
        .with_retry(fast_retry());

    assert!(matches!(
        client.fetch("48.85", "2.35").await,
        Err(ProtocolError::UnexpectedResponse(_))
    ));
}
