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

//! Recording endpoints: `recording_<verb>`, `recording_info`, `recording_list_table`.

use async_trait::async_trait;
use bbb_broker_types::actions::DEFAULT_ATTEMPTS;
use bbb_broker_types::responses::{recording_rows, RecordingRow};
use bbb_broker_types::{ActionRequest, AjaxQuery, RecordingAction, StateSnapshot};
use log::info;

use crate::convergence::{Converged, ConvergencePoller, StateProbe};
use crate::error::{ApiError, ConvergenceError};
use crate::BrokerClient;

impl BrokerClient {
    /// Build a request for `action` with its usual verification defaults.
    ///
    /// Actions that verify over several polls use the configured attempt
    /// budget; actions that pin a single check keep it.
    pub fn action_request(
        &self,
        action: RecordingAction,
        recording_id: &str,
        meeting_id: &str,
    ) -> ActionRequest {
        let request = ActionRequest::for_action(action, recording_id, meeting_id);
        if request.attempts == DEFAULT_ATTEMPTS {
            request.with_attempts(self.config().default_attempts)
        } else {
            request
        }
    }

    /// Send the action without any verification.
    ///
    /// Calls `GET ?action=recording_<verb>&id=..&idx=..[&meta=..]`.
    pub async fn issue_recording_action(
        &self,
        request: &ActionRequest,
    ) -> Result<StateSnapshot, ApiError> {
        let response = self.call(&AjaxQuery::recording_action(request)).await?;
        if response.status() == Some(false) {
            let message = response
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} {}", request.action, request.recording_id));
            return Err(ApiError::Rejected(message));
        }
        Ok(response)
    }

    /// Send the action, then poll until the recording reaches the request's goal.
    ///
    /// `request.attempt` is reset to 1 and advanced while polling.
    pub async fn perform_recording_action(
        &self,
        request: &mut ActionRequest,
    ) -> Result<Converged, ConvergenceError> {
        self.perform(request).await.map(|(done, _)| done)
    }

    /// Check that a recording is published, then return its playback URL.
    ///
    /// `href` is the playback link the caller already has. An empty link is
    /// refused before anything is sent; without one, the URL is taken from
    /// the `recording_play` answer.
    pub async fn play_recording(
        &self,
        request: &mut ActionRequest,
        href: Option<&str>,
    ) -> Result<String, ConvergenceError> {
        let href = href.map(str::trim);
        if href != Some("") {
            let (_, response) = self.perform(request).await?;
            if let Some(url) = href.or_else(|| response.playback_href()) {
                return Ok(url.to_string());
            }
        }
        Err(ConvergenceError::PlaybackUnreachable {
            recording_id: request.recording_id.clone(),
        })
    }

    async fn perform(
        &self,
        request: &mut ActionRequest,
    ) -> Result<(Converged, StateSnapshot), ConvergenceError> {
        if request.action.requires_goal() && request.verification().is_none() {
            return Err(ConvergenceError::GoalRequired {
                action: request.action.to_string(),
            });
        }
        request.attempt = 1;
        info!(
            "{} recording {} of meeting {}",
            request.action, request.recording_id, request.meeting_id
        );
        let response = self.issue_recording_action(request).await?;
        let done = ConvergencePoller::new(self)
            .with_backoff_unit(self.config().backoff_unit)
            .converge(request, &response)
            .await?;
        Ok((done, response))
    }

    /// Current state of the recording a request refers to.
    ///
    /// Calls `GET ?action=recording_info&id=..&idx=..[&meta=..]`.
    pub async fn recording_info(&self, request: &ActionRequest) -> Result<StateSnapshot, ApiError> {
        self.call(&AjaxQuery::recording_info(request)).await
    }

    /// Recordings listed for an activity.
    ///
    /// Calls `GET ?action=recording_list_table&id=..&bigbluebuttonbn=..`.
    pub async fn list_recordings(
        &self,
        meeting_id: &str,
        bigbluebuttonbn_id: &str,
    ) -> Result<Vec<RecordingRow>, ApiError> {
        let response = self
            .call(&AjaxQuery::recording_list_table(meeting_id, bigbluebuttonbn_id))
            .await?;
        if response.status() == Some(false) {
            return Err(ApiError::Rejected(
                response
                    .message()
                    .unwrap_or("recording list unavailable")
                    .to_string(),
            ));
        }
        Ok(recording_rows(&response))
    }
}

#[async_trait]
impl StateProbe for BrokerClient {
    async fn probe(&self, request: &ActionRequest) -> Result<StateSnapshot, ApiError> {
        self.recording_info(request).await
    }
}
