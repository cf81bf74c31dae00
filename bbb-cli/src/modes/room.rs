use std::time::Duration;

use bbb_broker_client::room::JOIN_REFRESH_DELAY;
use bbb_broker_client::{BrokerClient, RoomContext, RoomRefresher, RoomView};
use bbb_broker_types::MeetingInfo;
use bbb_cli::cli_args::{Activity, Room};
use tracing::{info, warn};

fn print_meeting(meeting: &MeetingInfo) {
    println!("{}", meeting.status.message);
    if let Some(counts) = &meeting.info {
        if let Some(started) = counts.started_at() {
            println!("Started at {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!(
            "Moderators: {}  Viewers: {}",
            counts.moderator_count,
            counts.viewer_count()
        );
    }
    if meeting.can_join() {
        if let Some(url) = &meeting.status.join_url {
            println!("Join: {url}");
        }
    }
}

pub async fn show(client: BrokerClient, args: Room) -> anyhow::Result<()> {
    let mut context = RoomContext::new(
        &args.activity.meeting_id,
        &args.activity.bigbluebuttonbn_id,
        args.status,
    );
    context.opening = args.opening;
    context.closing = args.closing;
    context.profile_features = args.features;
    if !context.shows_room() {
        warn!("the activity's profile does not show a room");
        return Ok(());
    }

    let mut refresher = RoomRefresher::new(client, context);
    if let Some(ms) = args.ping_interval_ms {
        refresher = refresher.with_ping_interval(Duration::from_millis(ms));
    }

    let meeting = match refresher.initial_view().await? {
        RoomView::ConferenceEnded => {
            println!("This conference has ended.");
            return Ok(());
        }
        RoomView::NotStarted { opening, closing } => {
            println!("This conference has not started yet.");
            if let Some(opening) = opening {
                println!("Opens: {opening}");
            }
            if let Some(closing) = closing {
                println!("Closes: {closing}");
            }
            return Ok(());
        }
        RoomView::Live(meeting) => meeting,
    };
    print_meeting(&meeting);

    let meeting = if args.watch && !meeting.can_join() {
        let meeting = refresher.watch().await?;
        print_meeting(&meeting);
        meeting
    } else {
        meeting
    };

    if args.join && meeting.can_join() {
        info!(
            "refreshing the room in {:?} once the join has settled",
            JOIN_REFRESH_DELAY
        );
        print_meeting(&refresher.refresh_after(JOIN_REFRESH_DELAY).await?);
    }
    Ok(())
}

pub async fn end(client: &BrokerClient, args: Activity) -> anyhow::Result<()> {
    if client
        .end_meeting(&args.meeting_id, &args.bigbluebuttonbn_id)
        .await?
    {
        println!("The meeting was ended.");
    } else {
        println!("The meeting could not be ended.");
    }
    Ok(())
}
