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

//! Meeting endpoints: `meeting_info`, `meeting_end`, completion validation.

use bbb_broker_types::{AjaxQuery, MeetingInfo};
use log::info;

use crate::error::ApiError;
use crate::BrokerClient;

impl BrokerClient {
    /// Status of the meeting behind an activity.
    ///
    /// Calls `GET ?action=meeting_info&id=..&bigbluebuttonbn=..[&updatecache=..]`.
    /// `update_cache` asks the broker to bypass its cached copy.
    pub async fn meeting_info(
        &self,
        meeting_id: &str,
        bigbluebuttonbn_id: &str,
        update_cache: Option<bool>,
    ) -> Result<MeetingInfo, ApiError> {
        let query = AjaxQuery::meeting_info(meeting_id, bigbluebuttonbn_id, update_cache);
        let response = self.call(&query).await?;
        MeetingInfo::from_snapshot(&response).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// End a running meeting. Returns whether the broker confirmed it.
    ///
    /// Calls `GET ?action=meeting_end&id=..&bigbluebuttonbn=..`.
    pub async fn end_meeting(
        &self,
        meeting_id: &str,
        bigbluebuttonbn_id: &str,
    ) -> Result<bool, ApiError> {
        let response = self
            .call(&AjaxQuery::meeting_end(meeting_id, bigbluebuttonbn_id))
            .await?;
        let ended = response.data_status().unwrap_or(false);
        info!("meeting {meeting_id}: end requested, confirmed={ended}");
        Ok(ended)
    }

    /// Ask Moodle to re-evaluate activity completion.
    ///
    /// `raw_query` is the query carried by a completion-validate link, with
    /// or without its leading `#` or `?`. Returns whether the re-evaluation
    /// was triggered.
    pub async fn validate_completion(&self, raw_query: &str) -> Result<bool, ApiError> {
        let raw = raw_query.trim_start_matches(['#', '?']);
        let query = AjaxQuery::from_pairs(url::form_urlencoded::parse(raw.as_bytes()).filter(
            // The session key is always taken from the configuration.
            |(key, _)| key != "sesskey",
        ));
        if query.action().is_none() {
            return Err(ApiError::InvalidQuery(format!(
                "completion query has no action: {raw_query}"
            )));
        }
        let response = self.call(&query).await?;
        Ok(response.data_status().unwrap_or(false))
    }
}
