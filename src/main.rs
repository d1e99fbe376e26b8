use std::sync::Arc;

use serenity::Client;
use serenity::model::gateway::GatewayIntents;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use myges_bot::config::BotConfig;
use myges_bot::discord::DiscordChannel;
use myges_bot::discord::handler::AgendaHandler;
use myges_bot::myges::{AgendaClient, MyGesConfig, MyGesHttpClient};
use myges_bot::services::{Reconciler, TickScheduler};
use myges_bot::state_store::FileStateStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "myges_bot=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::new_from_env()?;

    let agenda: Arc<dyn AgendaClient> = Arc::new(MyGesHttpClient::new(MyGesConfig {
        email: config.myges_email.clone(),
        password: config.myges_password.clone(),
    })?);

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = AgendaHandler {
        agenda: agenda.clone(),
        config: config.clone(),
    };

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    let channel = Arc::new(DiscordChannel::new(client.http.clone(), config.channel_id));
    let store = Arc::new(FileStateStore::new(config.state_file.clone()));
    let reconciler = Arc::new(Reconciler::new(
        agenda,
        channel,
        store,
        config.channel_id,
        config.timezone,
        config.evening_from,
    ));

    tokio::spawn(
        TickScheduler::new(reconciler, config.timezone, config.tick_times.clone()).start(),
    );

    info!("Starting Discord gateway");
    client.start().await?;

    Ok(())
}
