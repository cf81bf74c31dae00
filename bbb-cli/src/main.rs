use bbb_broker_client::BrokerClient;
use clap::Parser;
mod modes;

use bbb_cli::cli_args::{Mode, Opt};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // try_init also forwards the client's `log` records.
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish()
        .try_init()?;

    let opt = Opt::parse();

    // Settings files are checked offline.
    if let Mode::CheckSettings(args) = &opt.mode {
        return modes::settings::check(args);
    }

    let config = opt.broker_config()?;
    debug!("using broker at {}", config.datasource());
    let client = BrokerClient::new(config)?;

    match opt.mode {
        Mode::Recording(args) => modes::recording::perform(&client, args).await?,
        Mode::Recordings(args) => modes::recording::list(&client, args).await?,
        Mode::Room(args) => modes::room::show(client, args).await?,
        Mode::EndMeeting(args) => modes::room::end(&client, args).await?,
        Mode::Completion(args) => modes::completion::validate(&client, args).await?,
        Mode::CheckSettings(_) => {}
    };

    Ok(())
}
