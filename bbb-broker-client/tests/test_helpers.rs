/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Shared helpers for broker integration tests.

#![allow(dead_code)]

use std::time::Duration;

use bbb_broker_client::{BrokerClient, BrokerConfig};
use bbb_broker_types::requests::AJAX_PATH;
use wiremock::matchers::{method, path, query_param};
use wiremock::{MockBuilder, MockServer};

pub const SESSKEY: &str = "sesskey-test";

/// Client pointed at `server` with a 1ms backoff unit so retries are fast.
pub fn client_for(server: &MockServer) -> BrokerClient {
    let config = BrokerConfig::new(&server.uri(), SESSKEY)
        .with_backoff_unit(Duration::from_millis(1))
        .with_ping_interval(Duration::from_millis(5));
    BrokerClient::new(config).expect("valid test config")
}

/// A GET to the broker script for the given `action`, carrying the session key.
pub fn broker_call(action: &str) -> MockBuilder {
    wiremock::Mock::given(method("GET"))
        .and(path(AJAX_PATH))
        .and(query_param("sesskey", SESSKEY))
        .and(query_param("action", action))
}
