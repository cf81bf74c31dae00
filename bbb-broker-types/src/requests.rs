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

//! Query strings for the broker endpoint.
//!
//! Every call is a `GET` to [`AJAX_PATH`] whose behaviour is selected by the
//! `action` parameter. Recording calls identify the meeting with `idx`;
//! meeting calls identify the activity instance with `bigbluebuttonbn`.

use crate::actions::ActionRequest;

/// Path of the broker script below the Moodle `wwwroot`.
pub const AJAX_PATH: &str = "/mod/bigbluebuttonbn/bbb_ajax.php";

pub const ACTION_RECORDING_INFO: &str = "recording_info";
pub const ACTION_RECORDING_LIST_TABLE: &str = "recording_list_table";
pub const ACTION_MEETING_INFO: &str = "meeting_info";
pub const ACTION_MEETING_END: &str = "meeting_end";

/// Ordered query parameters for one broker call (without the session key).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AjaxQuery {
    params: Vec<(String, String)>,
}

impl AjaxQuery {
    pub fn new(action: &str) -> Self {
        Self::default().with("action", action)
    }

    /// Build a query from already-split pairs, e.g. a completion link's hash.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// `action=recording_<verb>&id=<recording>&idx=<meeting>[&meta=...]`
    pub fn recording_action(request: &ActionRequest) -> Self {
        Self::new(&request.action.ajax_action()).with_recording(request)
    }

    /// `action=recording_info&id=<recording>&idx=<meeting>[&meta=...]`
    pub fn recording_info(request: &ActionRequest) -> Self {
        Self::new(ACTION_RECORDING_INFO).with_recording(request)
    }

    pub fn recording_list_table(meeting_id: &str, bigbluebuttonbn_id: &str) -> Self {
        Self::new(ACTION_RECORDING_LIST_TABLE)
            .with("id", meeting_id)
            .with("bigbluebuttonbn", bigbluebuttonbn_id)
    }

    /// `updatecache` is only sent when the caller has an opinion about it.
    pub fn meeting_info(
        meeting_id: &str,
        bigbluebuttonbn_id: &str,
        update_cache: Option<bool>,
    ) -> Self {
        let query = Self::new(ACTION_MEETING_INFO)
            .with("id", meeting_id)
            .with("bigbluebuttonbn", bigbluebuttonbn_id);
        match update_cache {
            Some(update) => query.with("updatecache", if update { "true" } else { "false" }),
            None => query,
        }
    }

    pub fn meeting_end(meeting_id: &str, bigbluebuttonbn_id: &str) -> Self {
        Self::new(ACTION_MEETING_END)
            .with("id", meeting_id)
            .with("bigbluebuttonbn", bigbluebuttonbn_id)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn action(&self) -> Option<&str> {
        self.param("action")
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    fn with_recording(self, request: &ActionRequest) -> Self {
        let query = self
            .with("id", &request.recording_id)
            .with("idx", &request.meeting_id);
        match request.meta() {
            Some(meta) => query.with("meta", &meta),
            None => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_target_stays_on_the_caller_side() {
        let request = ActionRequest::update("rec-1", "meeting-1", "name", "name", "Week 3");
        let query = AjaxQuery::recording_action(&request);
        assert_eq!(query.action(), Some("recording_update"));
        assert_eq!(query.param("target"), None);
        assert_eq!(query.param("meta"), Some(r#"{"name":"Week 3"}"#));
    }

    #[test]
    fn recording_action_carries_meta_for_verified_requests() {
        let request = ActionRequest::publish("rec-1", "meeting-1");
        let query = AjaxQuery::recording_action(&request);
        assert_eq!(
            query.pairs(),
            &[
                ("action".to_string(), "recording_publish".to_string()),
                ("id".to_string(), "rec-1".to_string()),
                ("idx".to_string(), "meeting-1".to_string()),
                ("meta".to_string(), r#"{"published":"true"}"#.to_string()),
            ]
        );
    }

    #[test]
    fn info_query_reuses_recording_and_meta() {
        let request = ActionRequest::unprotect("rec-1", "meeting-1");
        let query = AjaxQuery::recording_info(&request);
        assert_eq!(query.action(), Some("recording_info"));
        assert_eq!(query.param("meta"), Some(r#"{"protected":"false"}"#));
    }

    #[test]
    fn unverified_requests_omit_meta() {
        let request = ActionRequest::import("rec-1", "meeting-1");
        assert_eq!(AjaxQuery::recording_action(&request).param("meta"), None);
    }

    #[test]
    fn meeting_info_only_sends_updatecache_when_asked() {
        let plain = AjaxQuery::meeting_info("m", "7", None);
        assert_eq!(plain.param("updatecache"), None);
        assert_eq!(plain.param("bigbluebuttonbn"), Some("7"));

        let refresh = AjaxQuery::meeting_info("m", "7", Some(true));
        assert_eq!(refresh.param("updatecache"), Some("true"));
    }
}
