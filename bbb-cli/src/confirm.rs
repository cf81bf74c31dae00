//! Confirmation prompt for destructive recording actions.

use std::io::{self, BufRead, Write};

use bbb_broker_types::ActionRequest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("Aborted: {0} was not confirmed")]
    Declined(String),

    #[error("Could not read confirmation: {0}")]
    Io(#[from] io::Error),
}

/// Question shown before `request` is sent.
pub fn confirmation_message(request: &ActionRequest, imported: bool) -> String {
    let kind = if imported { "link" } else { "recording" };
    format!(
        "Are you sure you want to {} the {kind} {}?",
        request.action, request.recording_id
    )
}

/// Ask on `output` and read a yes/no answer from `input`. Only `y`/`yes` accept.
pub fn confirm<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    request: &ActionRequest,
    imported: bool,
) -> Result<(), ConfirmError> {
    write!(output, "{} [y/N] ", confirmation_message(request, imported))?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => Err(ConfirmError::Declined(format!(
            "{} {}",
            request.action, request.recording_id
        ))),
    }
}
