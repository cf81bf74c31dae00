use std::env;
use std::path::PathBuf;

use bbb_broker_client::{ActivityStatus, ApiError, BrokerConfig};
use bbb_broker_types::RecordingAction;
use clap::{Args, Parser, Subcommand};

/// BigBlueButtonBN broker CLI
///
/// Talks to the `bbb_ajax.php` broker of a Moodle site to manage recordings
/// and follow the state of conference rooms.
///
/// The Moodle root URL and a valid session key are required for every
/// command that contacts the broker.
#[derive(Parser, Debug)]
#[clap(name = "bbb-cli")]
pub struct Opt {
    /// Moodle root URL, e.g. https://moodle.example.com
    #[clap(long = "wwwroot", env = "BBB_WWWROOT", global = true)]
    pub wwwroot: Option<String>,

    /// Moodle session key of an authenticated session.
    #[clap(long = "sesskey", env = "BBB_SESSKEY", global = true, hide_env_values = true)]
    pub sesskey: Option<String>,

    #[clap(subcommand)]
    pub mode: Mode,
}

impl Opt {
    /// Resolve the broker configuration from flags, then the environment.
    pub fn broker_config(&self) -> Result<BrokerConfig, ApiError> {
        BrokerConfig::from_lookup(|key| match key {
            "BBB_WWWROOT" => self.wwwroot.clone(),
            "BBB_SESSKEY" => self.sesskey.clone(),
            other => env::var(other).ok(),
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Perform an action on a recording and wait until it has taken effect.
    Recording(Recording),

    /// List the recordings of an activity.
    Recordings(Activity),

    /// Show a room's status, or wait until a moderator has joined.
    Room(Room),

    /// End the running meeting of an activity.
    EndMeeting(Activity),

    /// Trigger re-evaluation of activity completion from a completion link's query.
    Completion(Completion),

    /// Validate an activity instance settings file (JSON).
    CheckSettings(CheckSettings),
}

#[derive(Args, Debug, Clone)]
pub struct Recording {
    /// publish, unpublish, protect, unprotect, delete, import, update, edit or play.
    #[clap(value_parser = parse_action)]
    pub action: RecordingAction,

    #[clap(long = "recording-id")]
    pub recording_id: String,

    #[clap(long = "meeting-id")]
    pub meeting_id: String,

    /// The recording is an imported link (affects delete).
    #[clap(long = "imported")]
    pub imported: bool,

    /// Element of the recording being changed (update/edit); only used in the output.
    #[clap(long = "target")]
    pub target: Option<String>,

    /// State field to verify, overriding the action's default. Required for update and edit.
    #[clap(
        long = "source",
        requires = "goal",
        required_if_eq_any = [("action", "update"), ("action", "edit")]
    )]
    pub source: Option<String>,

    /// Value the state field must reach.
    #[clap(long = "goal", requires = "source")]
    pub goal: Option<String>,

    /// Maximum number of state checks after the action.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub attempts: Option<u32>,

    /// Playback link of the recording (play). Without it the broker's answer is used.
    #[clap(long = "href")]
    pub href: Option<String>,

    /// Do not ask for confirmation.
    #[clap(long = "yes", short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct Activity {
    #[clap(long = "meeting-id")]
    pub meeting_id: String,

    /// Id of the BigBlueButtonBN activity instance.
    #[clap(long = "bigbluebuttonbn")]
    pub bigbluebuttonbn_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct Room {
    #[clap(flatten)]
    pub activity: Activity,

    /// Schedule state of the activity: open, ended, or anything else for not started.
    #[clap(long = "activity", default_value = "open")]
    pub status: ActivityStatus,

    #[clap(long = "opening")]
    pub opening: Option<String>,

    #[clap(long = "closing")]
    pub closing: Option<String>,

    /// Features of the activity's profile (comma separated).
    #[clap(long = "features", value_delimiter = ',', default_value = "all")]
    pub features: Vec<String>,

    /// Keep polling until a moderator has joined.
    #[clap(long = "watch")]
    pub watch: bool,

    /// Print the join URL, then refresh the room once the join has settled.
    #[clap(long = "join")]
    pub join: bool,

    /// Poll interval while waiting, in milliseconds (0 = 10 seconds).
    #[clap(long = "ping-interval-ms")]
    pub ping_interval_ms: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct Completion {
    /// Query of the completion-validate link, e.g. "#action=completion_validate&bigbluebuttonbn=3".
    pub query: String,
}

#[derive(Args, Debug, Clone)]
pub struct CheckSettings {
    /// JSON file holding the instance settings.
    pub file: PathBuf,

    /// Version reported by the BBB server; older than 0.8 disables recording options.
    #[clap(long = "server-version")]
    pub server_version: Option<String>,
}

fn parse_action(s: &str) -> Result<RecordingAction, String> {
    s.parse().map_err(|err| format!("{err}"))
}
