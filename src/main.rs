use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use rostersync::api::ApiError;
use rostersync::cli::{Cli, Commands};
use rostersync::config::Config;
use rostersync::error::SyncError;
use rostersync::output::color::ColorWriter;
use rostersync::output::formatter::{get_formatter, Formatter};
use rostersync::output::roster_formatter;
use rostersync::store::UserUpdate;
use rostersync::{server, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(help) = operator_help(err) {
            eprintln!("Hint: {}", help);
        }
    }
    result
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "rostersync=debug,tower_http=debug"
    } else {
        "rostersync=info,tower_http=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_settings(&cli.settings)?;
    let syncer = config.build_syncer()?;
    let cancel = shutdown::setup_signal_handler()?;

    let formatter = get_formatter(&cli.format);
    let no_color = cli.no_color;

    match cli.command {
        Commands::InitUsers => {
            let count = syncer.initialize_users().await?;
            let data = json!({ "message": "Users initialized successfully", "count": count });
            emit(formatter, no_color, &data, |w| {
                w.print_field("Users synced", &count.to_string())
            })?;
        }
        Commands::InitChannels => {
            let count = syncer.initialize_channels().await?;
            let data = json!({ "message": "Channels initialized successfully", "count": count });
            emit(formatter, no_color, &data, |w| {
                w.print_field("Channels synced", &count.to_string())
            })?;
        }
        Commands::Users => {
            let users = syncer.get_all_users().await?;
            emit(formatter, no_color, &json!({ "users": users }), |w| {
                roster_formatter::format_users(&users, w)
            })?;
        }
        Commands::Channels => {
            let channels = syncer.get_all_channels().await?;
            emit(formatter, no_color, &json!({ "channels": channels }), |w| {
                roster_formatter::format_teams(&channels, w)
            })?;
        }
        Commands::History { channel_id, save } => {
            let records = if save {
                syncer.save_channel_conversations(&channel_id, &cancel).await?
            } else {
                syncer.initialize_channel_conversations(&channel_id, &cancel).await?
            };
            let data = json!({ "channel_id": channel_id, "messages": records });
            emit(formatter, no_color, &data, |w| {
                roster_formatter::format_conversations(&channel_id, &records, w)
            })?;
        }
        Commands::StoredHistory { channel_id } => {
            let stored = syncer.stored_conversations(&channel_id).await?;
            let data = json!({ "channel_id": channel_id, "messages": stored });
            emit(formatter, no_color, &data, |w| {
                roster_formatter::format_stored_conversations(&channel_id, &stored, w)
            })?;
        }
        Commands::UpdateUser {
            id,
            user_key,
            user_name,
            grade,
            team_key,
        } => {
            syncer
                .update_user(
                    id,
                    UserUpdate {
                        user_key,
                        user_name,
                        grade,
                        team_key,
                    },
                )
                .await?;
            println!("✓ User with id {} updated successfully", id);
        }
        Commands::Serve { bind, cors_origin } => {
            server::serve(syncer, bind, &cors_origin, cancel).await?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(
    formatter: Formatter,
    no_color: bool,
    data: &T,
    human: impl FnOnce(&mut ColorWriter) -> std::io::Result<()>,
) -> Result<()> {
    match formatter.structured(data)? {
        Some(text) => println!("{}", text),
        None => {
            let mut writer = ColorWriter::new(no_color);
            human(&mut writer)?;
            print!("{}", writer.into_string()?);
        }
    }
    Ok(())
}

fn operator_help(err: &anyhow::Error) -> Option<&'static str> {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return api.help();
        }
        if let Some(SyncError::AuthorizationFailed { code, needed, .. }) =
            cause.downcast_ref::<SyncError>()
        {
            return ApiError::Slack {
                code: code.clone(),
                needed: needed.clone(),
                provided: None,
            }
            .help();
        }
    }
    None
}
