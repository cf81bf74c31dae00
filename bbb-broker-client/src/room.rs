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

//! Room status: the initial view of an activity and the wait for a moderator.
//!
//! Unlike recording verification this is a plain level-triggered poll: a
//! fixed interval, no backoff, no attempt limit. It stops once the meeting
//! is running. Dropping the future cancels it.

use std::str::FromStr;
use std::time::Duration;

use bbb_broker_types::MeetingInfo;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::ping_interval_or_default;
use crate::error::ApiError;
use crate::BrokerClient;

/// Delay before refreshing the room after the user opened the join URL.
pub const JOIN_REFRESH_DELAY: Duration = Duration::from_secs(15);

/// Whether the activity's schedule currently allows a conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Open,
    Ended,
    #[serde(other)]
    NotStarted,
}

impl FromStr for ActivityStatus {
    type Err = std::convert::Infallible;

    /// Anything that is neither `open` nor `ended` has not started yet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "open" => ActivityStatus::Open,
            "ended" => ActivityStatus::Ended,
            _ => ActivityStatus::NotStarted,
        })
    }
}

/// Identity and schedule of the activity whose room is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomContext {
    pub meeting_id: String,
    pub bigbluebuttonbn_id: String,
    pub activity: ActivityStatus,
    #[serde(default)]
    pub opening: Option<String>,
    #[serde(default)]
    pub closing: Option<String>,
    #[serde(default)]
    pub profile_features: Vec<String>,
}

impl RoomContext {
    pub fn new(meeting_id: &str, bigbluebuttonbn_id: &str, activity: ActivityStatus) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            bigbluebuttonbn_id: bigbluebuttonbn_id.to_string(),
            activity,
            opening: None,
            closing: None,
            profile_features: vec!["all".to_string()],
        }
    }

    /// Whether the activity's profile includes the room at all.
    pub fn shows_room(&self) -> bool {
        self.profile_features
            .iter()
            .any(|feature| feature == "all" || feature == "showroom")
    }
}

/// What the room shows when it is first opened.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomView {
    /// The activity's closing time has passed.
    ConferenceEnded,
    /// The activity has not opened yet.
    NotStarted {
        opening: Option<String>,
        closing: Option<String>,
    },
    /// The activity is open; the meeting's live status.
    Live(MeetingInfo),
}

/// Refreshes the status of one activity's room.
#[derive(Debug, Clone)]
pub struct RoomRefresher {
    client: BrokerClient,
    context: RoomContext,
    ping_interval: Duration,
}

impl RoomRefresher {
    pub fn new(client: BrokerClient, context: RoomContext) -> Self {
        let ping_interval = client.config().effective_ping_interval();
        Self {
            client,
            context,
            ping_interval,
        }
    }

    /// A zero interval selects the 10 second default.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = ping_interval_or_default(interval);
        self
    }

    pub fn context(&self) -> &RoomContext {
        &self.context
    }

    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// The view for a freshly opened room.
    ///
    /// Closed activities are answered from the schedule alone, without
    /// contacting the broker.
    pub async fn initial_view(&self) -> Result<RoomView, ApiError> {
        match self.context.activity {
            ActivityStatus::Ended => Ok(RoomView::ConferenceEnded),
            ActivityStatus::NotStarted => Ok(RoomView::NotStarted {
                opening: self.context.opening.clone(),
                closing: self.context.closing.clone(),
            }),
            ActivityStatus::Open => self.update_room(false).await.map(RoomView::Live),
        }
    }

    /// Fetch the meeting status, optionally bypassing the broker's cache.
    pub async fn update_room(&self, update_cache: bool) -> Result<MeetingInfo, ApiError> {
        self.client
            .meeting_info(
                &self.context.meeting_id,
                &self.context.bigbluebuttonbn_id,
                Some(update_cache),
            )
            .await
    }

    /// Show the room and, if the user may not join yet, wait for a moderator.
    pub async fn watch(&self) -> Result<MeetingInfo, ApiError> {
        let meeting = self.update_room(false).await?;
        if meeting.can_join() {
            return Ok(meeting);
        }
        self.wait_for_moderator().await
    }

    /// Poll until the meeting is running, then refresh the room once.
    ///
    /// Failed polls are logged and polling continues.
    pub async fn wait_for_moderator(&self) -> Result<MeetingInfo, ApiError> {
        info!(
            "meeting {}: waiting for a moderator, polling every {:?}",
            self.context.meeting_id, self.ping_interval
        );
        let mut ticker = interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self
                .client
                .meeting_info(
                    &self.context.meeting_id,
                    &self.context.bigbluebuttonbn_id,
                    None,
                )
                .await
            {
                Ok(meeting) if meeting.running => {
                    info!("meeting {}: running", self.context.meeting_id);
                    return self.update_room(false).await;
                }
                Ok(_) => debug!("meeting {}: not running yet", self.context.meeting_id),
                Err(err) => warn!("meeting {}: status poll failed: {err}", self.context.meeting_id),
            }
        }
    }

    /// Refresh the room after `delay`, bypassing the cache.
    ///
    /// Used after the user has been sent to the join URL, when the
    /// meeting's participant counts are about to change.
    pub async fn refresh_after(&self, delay: Duration) -> Result<MeetingInfo, ApiError> {
        tokio::time::sleep(delay).await;
        self.update_room(true).await
    }
}
