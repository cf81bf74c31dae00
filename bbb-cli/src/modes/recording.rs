use std::io;

use bbb_broker_client::BrokerClient;
use bbb_broker_types::{ActionRequest, RecordingAction};
use bbb_cli::cli_args::{Activity, Recording};
use bbb_cli::confirm::confirm;
use tracing::info;

/// Build the request the flags describe.
fn build_request(client: &BrokerClient, args: &Recording) -> ActionRequest {
    let mut request = if args.action == RecordingAction::Delete && args.imported {
        ActionRequest::delete(&args.recording_id, &args.meeting_id, true)
    } else {
        client.action_request(args.action, &args.recording_id, &args.meeting_id)
    };
    if let Some(target) = &args.target {
        request = request.with_target(target);
    }
    if let (Some(source), Some(goal)) = (&args.source, &args.goal) {
        request = request.with_goal(source, goal.trim());
    }
    if let Some(attempts) = args.attempts {
        request = request.with_attempts(attempts);
    }
    request
}

pub async fn perform(client: &BrokerClient, args: Recording) -> anyhow::Result<()> {
    let mut request = build_request(client, &args);
    if request.requires_confirmation() && !args.yes {
        confirm(io::stdin().lock(), io::stdout(), &request, args.imported)?;
    }

    let subject = match &request.target {
        Some(target) => format!("{} {} of {}", request.action, target, request.recording_id),
        None => format!("{} {}", request.action, request.recording_id),
    };

    if request.action == RecordingAction::Play {
        let url = client
            .play_recording(&mut request, args.href.as_deref())
            .await?;
        println!("{subject}: {url}");
        return Ok(());
    }

    let done = client.perform_recording_action(&mut request).await?;
    info!("{subject} confirmed after {} check(s)", done.verifications);
    println!("{subject}: done");
    if done.next_action != request.action {
        println!("next available action: {}", done.next_action);
    }
    Ok(())
}

pub async fn list(client: &BrokerClient, args: Activity) -> anyhow::Result<()> {
    let rows = client
        .list_recordings(&args.meeting_id, &args.bigbluebuttonbn_id)
        .await?;
    if rows.is_empty() {
        println!("There are no recordings for this activity.");
        return Ok(());
    }
    for row in rows {
        let id = row.recording_id().unwrap_or("?");
        let name = row
            .get("name")
            .or_else(|| row.get("recording"))
            .and_then(|value| value.as_str())
            .unwrap_or("");
        println!("{id}\t{name}");
    }
    Ok(())
}
