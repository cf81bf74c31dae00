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

//! Shared wire types for the BigBlueButtonBN AJAX broker.
//!
//! This crate defines the contract between the Moodle-hosted `bbb_ajax.php`
//! proxy and its consumers (the async client, the CLI, integration tests).
//! It is intentionally transport-agnostic: no HTTP client, no runtime.

pub mod actions;
pub mod error;
pub mod requests;
pub mod responses;
pub mod settings;

pub use actions::{ActionRequest, GoalState, RecordingAction};
pub use error::{ParseActionError, SettingsError};
pub use requests::AjaxQuery;
pub use responses::{MeetingInfo, StateSnapshot};
pub use settings::InstanceSettings;
