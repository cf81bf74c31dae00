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

//! Settings of a BigBlueButtonBN activity instance.
//!
//! These mirror the fields of the activity form and the rules it enforces
//! before an instance is saved. Storage stays with Moodle; this module only
//! checks that a set of values is acceptable.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Longest accepted activity name.
pub const NAME_MAX_LEN: usize = 64;

/// Oldest BBB server version that supports recording options.
pub const RECORDING_MIN_SERVER_VERSION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    #[default]
    All,
    Role,
    User,
}

impl SelectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionType::All => "all",
            SelectionType::Role => "role",
            SelectionType::User => "user",
        }
    }
}

/// Role a participant entry is given inside the conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BbbRole {
    #[default]
    Viewer,
    Moderator,
}

/// One line of the participant list: who (everyone, a role, a user) joins as what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "selectiontype")]
    pub selection_type: SelectionType,
    #[serde(rename = "selectionid", default)]
    pub selection_id: String,
    #[serde(default)]
    pub role: BbbRole,
}

/// Editable settings of an activity instance.
///
/// Times are Unix seconds; `0` means "not set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstanceSettings {
    pub name: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub welcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voicebridge: Option<u32>,
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub record: bool,
    #[serde(default)]
    pub tagging: bool,
    #[serde(default)]
    pub newwindow: bool,
    #[serde(default)]
    pub openingtime: i64,
    #[serde(default)]
    pub closingtime: i64,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl InstanceSettings {
    /// Check every form rule and return all violations found.
    pub fn validate(&self) -> Result<(), Vec<SettingsError>> {
        let mut errors = Vec::new();

        let name_len = self.name.trim().chars().count();
        if name_len == 0 {
            errors.push(SettingsError::NameRequired);
        } else if name_len > NAME_MAX_LEN {
            errors.push(SettingsError::NameTooLong {
                len: name_len,
                max: NAME_MAX_LEN,
            });
        }

        // 0 is the form's "no voice bridge" default.
        if let Some(bridge) = self.voicebridge {
            if bridge != 0 && !(1000..=9999).contains(&bridge) {
                errors.push(SettingsError::VoiceBridgeFormat(bridge));
            }
        }

        if self.openingtime != 0 && self.closingtime != 0 && self.closingtime < self.openingtime {
            errors.push(SettingsError::ClosingBeforeOpening {
                opening: self.openingtime,
                closing: self.closingtime,
            });
        }

        for (index, participant) in self.participants.iter().enumerate() {
            if participant.selection_type != SelectionType::All
                && participant.selection_id.trim().is_empty()
            {
                errors.push(SettingsError::ParticipantSelectionMissing {
                    index,
                    selection_type: participant.selection_type.as_str().to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Drop options the connected BBB server cannot honour.
    ///
    /// Servers older than 0.8 have no recording support, so `record` and
    /// `tagging` are forced off. Unparseable versions are left alone.
    /// Returns whether anything changed.
    pub fn apply_server_version(&mut self, version: &str) -> bool {
        let Ok(version) = version.trim().parse::<f64>() else {
            return false;
        };
        if version >= RECORDING_MIN_SERVER_VERSION || !(self.record || self.tagging) {
            return false;
        }
        self.record = false;
        self.tagging = false;
        true
    }

    /// Whether the schedule section carries any value.
    pub fn has_schedule(&self) -> bool {
        self.openingtime != 0 || self.closingtime != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> InstanceSettings {
        InstanceSettings {
            name: "Weekly seminar".to_string(),
            voicebridge: Some(1234),
            openingtime: 1_700_000_000,
            closingtime: 1_700_003_600,
            participants: vec![Participant {
                selection_type: SelectionType::All,
                selection_id: "all".to_string(),
                role: BbbRole::Viewer,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_complete_instance() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn reports_every_violation() {
        let settings = InstanceSettings {
            name: "   ".to_string(),
            voicebridge: Some(123),
            openingtime: 200,
            closingtime: 100,
            participants: vec![Participant {
                selection_type: SelectionType::Role,
                selection_id: String::new(),
                role: BbbRole::Moderator,
            }],
            ..Default::default()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                SettingsError::NameRequired,
                SettingsError::VoiceBridgeFormat(123),
                SettingsError::ClosingBeforeOpening {
                    opening: 200,
                    closing: 100
                },
                SettingsError::ParticipantSelectionMissing {
                    index: 0,
                    selection_type: "role".to_string()
                },
            ]
        );
    }

    #[test]
    fn long_names_are_rejected() {
        let settings = InstanceSettings {
            name: "x".repeat(65),
            ..valid()
        };
        assert_eq!(
            settings.validate(),
            Err(vec![SettingsError::NameTooLong { len: 65, max: 64 }])
        );
    }

    #[test]
    fn unset_times_and_zero_bridge_are_fine() {
        let settings = InstanceSettings {
            voicebridge: Some(0),
            openingtime: 0,
            closingtime: 5,
            ..valid()
        };
        assert_eq!(settings.validate(), Ok(()));
        assert!(settings.has_schedule());
    }

    #[test]
    fn old_servers_lose_recording_options() {
        let mut settings = InstanceSettings {
            record: true,
            tagging: true,
            ..valid()
        };
        assert!(!settings.apply_server_version("2.4"));
        assert!(settings.record);
        assert!(settings.apply_server_version("0.7"));
        assert!(!settings.record && !settings.tagging);
        assert!(!settings.apply_server_version("not-a-version"));
    }

    #[test]
    fn decodes_form_field_names() {
        let settings: InstanceSettings = serde_json::from_value(json!({
            "name": "Room",
            "participants": [
                {"selectiontype": "user", "selectionid": "42", "role": "moderator"}
            ]
        }))
        .unwrap();
        assert_eq!(settings.participants[0].selection_type, SelectionType::User);
        assert_eq!(settings.participants[0].role, BbbRole::Moderator);
        assert!(settings.voicebridge.is_none());
    }
}
