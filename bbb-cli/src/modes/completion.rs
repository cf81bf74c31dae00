use bbb_broker_client::BrokerClient;
use bbb_cli::cli_args::Completion;

pub async fn validate(client: &BrokerClient, args: Completion) -> anyhow::Result<()> {
    if client.validate_completion(&args.query).await? {
        println!("Completion state re-evaluation was triggered.");
    } else {
        println!("The completion state was not re-evaluated.");
    }
    Ok(())
}
