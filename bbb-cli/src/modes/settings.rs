use std::fs;

use anyhow::Context;
use bbb_broker_types::InstanceSettings;
use bbb_cli::cli_args::CheckSettings;
use tracing::info;

pub fn check(args: &CheckSettings) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut settings: InstanceSettings = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.file.display()))?;

    if let Some(version) = &args.server_version {
        if settings.apply_server_version(version) {
            info!("server {version} does not support recording options; disabled");
        }
    }

    match settings.validate() {
        Ok(()) => {
            println!("{}: ok", args.file.display());
            if settings.has_schedule() {
                println!(
                    "schedule: opens {} closes {}",
                    settings.openingtime, settings.closingtime
                );
            }
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("{}: {error}", args.file.display());
            }
            anyhow::bail!("{} setting(s) invalid", errors.len())
        }
    }
}
