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

//! Error types shared by broker consumers.

use thiserror::Error;

/// Returned when a string does not name a known recording action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown recording action: {0}")]
pub struct ParseActionError(pub String);

/// A single violated rule of an activity instance's settings.
///
/// [`InstanceSettings::validate`](crate::settings::InstanceSettings::validate)
/// collects every violation instead of stopping at the first one, so the
/// caller can report them all at once, the way the activity form does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The activity name is empty.
    #[error("The activity name is required")]
    NameRequired,

    /// The activity name exceeds the form's limit.
    #[error("The activity name is {len} characters long, maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    /// The voice bridge is not a four digit number.
    #[error("Voice bridge {0} must be a 4 digit number between 1000 and 9999")]
    VoiceBridgeFormat(u32),

    /// The closing time is set before the opening time.
    #[error("Closing time ({closing}) is before opening time ({opening})")]
    ClosingBeforeOpening { opening: i64, closing: i64 },

    /// A role or user participant entry has no selection id.
    #[error("Participant entry {index} of type '{selection_type}' has no selection id")]
    ParticipantSelectionMissing {
        index: usize,
        selection_type: String,
    },
}
