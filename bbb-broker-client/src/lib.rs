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

//! Async client for the BigBlueButtonBN AJAX broker (`bbb_ajax.php`).
//!
//! The broker is a Moodle-hosted proxy in front of a BigBlueButton server.
//! This crate issues recording actions and confirms that they took effect,
//! queries and ends meetings, and polls a room until a moderator arrives.
//!
//! # Example
//!
//! ```no_run
//! use bbb_broker_client::{BrokerClient, BrokerConfig};
//! use bbb_broker_client::bbb_broker_types::ActionRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BrokerConfig::new("https://moodle.example.com", "sesskey123");
//! let client = BrokerClient::new(config)?;
//!
//! let mut request = ActionRequest::publish("recording-1", "meeting-1");
//! let done = client.perform_recording_action(&mut request).await?;
//! println!("published after {} check(s)", done.verifications);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convergence;
pub mod error;
pub mod meetings;
pub mod recordings;
pub mod room;

pub use bbb_broker_types;
pub use config::BrokerConfig;
pub use convergence::{Converged, ConvergencePoller, PollStep, StateProbe};
pub use error::{ApiError, ConvergenceError};
pub use room::{ActivityStatus, RoomContext, RoomRefresher, RoomView};

use bbb_broker_types::{AjaxQuery, StateSnapshot};
use log::debug;
use reqwest::Client;

/// A typed client for one Moodle site's broker endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    config: BrokerConfig,
    datasource: String,
    http: Client,
}

impl BrokerClient {
    /// Create a client from explicit configuration.
    pub fn new(config: BrokerConfig) -> Result<Self, ApiError> {
        if config.wwwroot.is_empty() {
            return Err(ApiError::Config("wwwroot must not be empty".to_string()));
        }
        if config.sesskey.is_empty() {
            return Err(ApiError::Config("sesskey must not be empty".to_string()));
        }
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            datasource: config.datasource(),
            config,
            http,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Full URL of the broker script.
    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    /// Send one broker call and decode its JSON body.
    pub(crate) async fn call(&self, query: &AjaxQuery) -> Result<StateSnapshot, ApiError> {
        debug!(
            "GET {} action={}",
            self.datasource,
            query.action().unwrap_or("-")
        );
        let response = self
            .http
            .get(&self.datasource)
            .query(&[("sesskey", self.config.sesskey.as_str())])
            .query(query.pairs())
            .send()
            .await?;
        parse_snapshot(response).await
    }
}

/// Map a broker response to a [`StateSnapshot`], turning non-2xx statuses
/// and non-JSON bodies into [`ApiError`]s.
pub(crate) async fn parse_snapshot(response: reqwest::Response) -> Result<StateSnapshot, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::ServerError {
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text().await?;
    serde_json::from_str::<serde_json::Value>(&text)
        .map(StateSnapshot::new)
        .map_err(|err| ApiError::Decode(format!("{err}: {text}")))
}
