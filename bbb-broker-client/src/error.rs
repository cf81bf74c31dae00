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

//! Error types for the broker client.

use thiserror::Error;

/// Errors returned by [`BrokerClient`](crate::BrokerClient) methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The broker answered with a non-2xx status.
    #[error("Request failed: {status} responseText: {body}")]
    ServerError { status: u16, body: String },

    /// The broker answered `status: false`.
    #[error("The broker rejected the request: {0}")]
    Rejected(String),

    /// The body was not the JSON the endpoint is documented to return.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A network or transport error.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Caller input that cannot be turned into a broker call.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A configuration error (e.g. missing session key).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why an action could not be confirmed.
///
/// Every variant is terminal: the poll loop stops and the user has to
/// trigger the action again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvergenceError {
    /// An HTTP call failed; carries the transport error text.
    #[error("{0}")]
    Transport(String),

    /// The broker refused the action itself.
    #[error("The action was rejected: {0}")]
    Rejected(String),

    /// The state field to verify is missing from the response.
    #[error("The current state of the recording could not be found (field '{field}')")]
    StateNotFound { field: String },

    /// The action changes a caller-chosen field but no field and value were given.
    #[error("The {action} action needs a state field and goal to verify")]
    GoalRequired { action: String },

    /// The recording has no playback URL to hand out.
    #[error("The recording {recording_id} has no reachable playback URL")]
    PlaybackUnreachable { recording_id: String },

    /// The goal was not reached within the attempt budget.
    #[error("The action could not be completed after {attempts} attempt(s)")]
    NotCompleted { attempts: u32 },
}

impl From<ApiError> for ConvergenceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(message) => ConvergenceError::Rejected(message),
            other => ConvergenceError::Transport(other.to_string()),
        }
    }
}
