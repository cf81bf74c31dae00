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

//! Recording actions and the goal states used to verify them.
//!
//! An [`ActionRequest`] describes one intent to change (or query) a single
//! recording. Requests that carry a `source` field name and a
//! [`GoalState`] are verified after they are issued: the broker is polled
//! until the field named by `source` reaches the goal, or the request runs
//! out of attempts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseActionError;

/// Number of verification attempts used when a request does not say otherwise.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// An operation on a recording exposed by the broker as `recording_<verb>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingAction {
    Publish,
    Unpublish,
    Protect,
    Unprotect,
    Delete,
    Import,
    Update,
    Edit,
    Play,
}

impl RecordingAction {
    pub const ALL: [RecordingAction; 9] = [
        RecordingAction::Publish,
        RecordingAction::Unpublish,
        RecordingAction::Protect,
        RecordingAction::Unprotect,
        RecordingAction::Delete,
        RecordingAction::Import,
        RecordingAction::Update,
        RecordingAction::Edit,
        RecordingAction::Play,
    ];

    /// The bare verb, e.g. `"publish"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingAction::Publish => "publish",
            RecordingAction::Unpublish => "unpublish",
            RecordingAction::Protect => "protect",
            RecordingAction::Unprotect => "unprotect",
            RecordingAction::Delete => "delete",
            RecordingAction::Import => "import",
            RecordingAction::Update => "update",
            RecordingAction::Edit => "edit",
            RecordingAction::Play => "play",
        }
    }

    /// The value of the `action` query parameter, e.g. `"recording_publish"`.
    pub fn ajax_action(&self) -> String {
        format!("recording_{}", self.as_str())
    }

    /// Actions whose goal is only known to the caller (the field and value
    /// being changed) and so cannot be sent without one.
    pub fn requires_goal(&self) -> bool {
        matches!(self, RecordingAction::Update | RecordingAction::Edit)
    }

    /// The action that becomes available once this one has completed.
    ///
    /// Toggles map to their opposite; everything else maps to itself.
    pub fn reversed(self) -> Self {
        match self {
            RecordingAction::Publish => RecordingAction::Unpublish,
            RecordingAction::Unpublish => RecordingAction::Publish,
            RecordingAction::Protect => RecordingAction::Unprotect,
            RecordingAction::Unprotect => RecordingAction::Protect,
            other => other,
        }
    }
}

impl fmt::Display for RecordingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordingAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let verb = s.trim().to_ascii_lowercase();
        let verb = verb.strip_prefix("recording_").unwrap_or(&verb);
        RecordingAction::ALL
            .into_iter()
            .find(|action| action.as_str() == verb)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// The value a state field is expected to reach.
///
/// The broker is not consistent about types: booleans may come back as JSON
/// booleans or as the strings `"true"` / `"false"`. Matching is therefore
/// loose for booleans and exact for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GoalState {
    Bool(bool),
    Text(String),
}

impl GoalState {
    /// Whether the observed JSON value satisfies this goal.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (GoalState::Bool(goal), Value::Bool(seen)) => goal == seen,
            (GoalState::Bool(goal), Value::String(seen)) => seen == bool_str(*goal),
            (GoalState::Text(goal), Value::String(seen)) => goal == seen,
            (GoalState::Text(goal), Value::Bool(seen)) => goal == bool_str(*seen),
            (GoalState::Text(goal), Value::Number(seen)) => *goal == seen.to_string(),
            _ => false,
        }
    }

    /// String form sent inside the `meta` query parameter.
    pub fn as_wire(&self) -> String {
        match self {
            GoalState::Bool(goal) => bool_str(*goal).to_string(),
            GoalState::Text(goal) => goal.clone(),
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl From<bool> for GoalState {
    fn from(value: bool) -> Self {
        GoalState::Bool(value)
    }
}

impl From<&str> for GoalState {
    fn from(value: &str) -> Self {
        GoalState::Text(value.to_string())
    }
}

impl From<String> for GoalState {
    fn from(value: String) -> Self {
        GoalState::Text(value)
    }
}

impl fmt::Display for GoalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

/// An intent to change or query the state of one recording.
///
/// `attempts` bounds how many times the broker is asked for the recording's
/// state after the action is issued; `attempt` is the 1-based counter of the
/// verification currently in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: RecordingAction,
    pub recording_id: String,
    pub meeting_id: String,
    /// Sub-element the action applies to (e.g. `name` or `description` for
    /// edits). Caller-side context for reporting; never sent to the broker.
    pub target: Option<String>,
    /// Name of the state field to inspect when verifying.
    pub source: Option<String>,
    pub goal_state: Option<GoalState>,
    pub attempts: u32,
    pub attempt: u32,
    /// Whether a user should confirm before the action is sent.
    pub confirmation: bool,
}

impl ActionRequest {
    /// A request with no verification and the default attempt budget.
    pub fn new(action: RecordingAction, recording_id: &str, meeting_id: &str) -> Self {
        Self {
            action,
            recording_id: recording_id.to_string(),
            meeting_id: meeting_id.to_string(),
            target: None,
            source: None,
            goal_state: None,
            attempts: DEFAULT_ATTEMPTS,
            attempt: 1,
            confirmation: false,
        }
    }

    /// A request pre-filled with the verification defaults for `action`.
    ///
    /// `update` and `edit` carry no defaults: the caller names the field and
    /// value with [`with_goal`](Self::with_goal). Deletes are built for a
    /// regular recording; use [`delete`](Self::delete) for imported links.
    pub fn for_action(action: RecordingAction, recording_id: &str, meeting_id: &str) -> Self {
        match action {
            RecordingAction::Publish => Self::publish(recording_id, meeting_id),
            RecordingAction::Unpublish => Self::unpublish(recording_id, meeting_id),
            RecordingAction::Protect => Self::protect(recording_id, meeting_id),
            RecordingAction::Unprotect => Self::unprotect(recording_id, meeting_id),
            RecordingAction::Delete => Self::delete(recording_id, meeting_id, false),
            RecordingAction::Import => Self::import(recording_id, meeting_id),
            RecordingAction::Play => Self::play(recording_id, meeting_id),
            RecordingAction::Update | RecordingAction::Edit => {
                Self::new(action, recording_id, meeting_id)
            }
        }
    }

    pub fn publish(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Publish, recording_id, meeting_id).with_goal("published", "true")
    }

    pub fn unpublish(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Unpublish, recording_id, meeting_id)
            .with_goal("published", "false")
    }

    pub fn protect(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Protect, recording_id, meeting_id).with_goal("protected", "true")
    }

    pub fn unprotect(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Unprotect, recording_id, meeting_id)
            .with_goal("protected", "false")
    }

    /// Delete a recording.
    ///
    /// A regular recording is verified by polling until it is no longer
    /// `found`, and asks for confirmation first. An imported link is removed
    /// locally by the broker, so its own response (`status: true`) is the
    /// only check and no confirmation is needed.
    pub fn delete(recording_id: &str, meeting_id: &str, imported: bool) -> Self {
        let request = Self::new(RecordingAction::Delete, recording_id, meeting_id);
        if imported {
            request.with_goal("status", true).with_attempts(1)
        } else {
            request.with_goal("found", false).with_confirmation(true)
        }
    }

    /// Import a recording into the current activity. Not verified.
    pub fn import(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Import, recording_id, meeting_id).with_confirmation(true)
    }

    /// Change a field of a recording's metadata.
    pub fn update(
        recording_id: &str,
        meeting_id: &str,
        target: &str,
        source: &str,
        goal: impl Into<GoalState>,
    ) -> Self {
        Self::new(RecordingAction::Update, recording_id, meeting_id)
            .with_target(target)
            .with_goal(source, goal)
    }

    /// Rename a recording element (an `update` issued from an inline edit).
    pub fn edit(
        recording_id: &str,
        meeting_id: &str,
        target: &str,
        source: &str,
        text: &str,
    ) -> Self {
        Self::new(RecordingAction::Edit, recording_id, meeting_id)
            .with_target(target)
            .with_goal(source, text.trim())
    }

    /// Check that a recording is published before handing out its playback URL.
    ///
    /// The check is the action response itself; see
    /// `BrokerClient::play_recording` for how the URL is resolved.
    pub fn play(recording_id: &str, meeting_id: &str) -> Self {
        Self::new(RecordingAction::Play, recording_id, meeting_id)
            .with_goal("published", "true")
            .with_attempts(1)
    }

    pub fn with_goal(mut self, source: &str, goal: impl Into<GoalState>) -> Self {
        self.source = Some(source.to_string());
        self.goal_state = Some(goal.into());
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_confirmation(mut self, confirmation: bool) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirmation
    }

    /// The field name and goal to verify, if this request is verified at all.
    pub fn verification(&self) -> Option<(&str, &GoalState)> {
        match (&self.source, &self.goal_state) {
            (Some(source), Some(goal)) => Some((source.as_str(), goal)),
            _ => None,
        }
    }

    /// Value of the `meta` query parameter: `{"<source>":"<goal>"}`.
    pub fn meta(&self) -> Option<String> {
        let (source, goal) = self.verification()?;
        let mut meta = serde_json::Map::new();
        meta.insert(source.to_string(), Value::String(goal.as_wire()));
        Some(Value::Object(meta).to_string())
    }

    /// Whether another verification may follow the current one.
    pub fn has_attempts_left(&self) -> bool {
        self.attempt < self.attempts
    }
}
