use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use serenity::async_trait;
use serenity::builder::CreateMessage;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::discord::embed::ScheduleEmbed;
use crate::error::AppError;
use crate::filter::{canonical_order, filter_courses};
use crate::myges::{AgendaClient, day_span_millis};

const COMMAND_PREFIX: &str = "!agenda";

/// Gateway events: connection logging and the on-demand `!agenda` query.
///
/// The query path is read-only (fetch, filter, reply) and never touches
/// the reconciler or its persisted state.
pub struct AgendaHandler {
    pub agenda: Arc<dyn AgendaClient>,
    pub config: BotConfig,
}

impl AgendaHandler {
    async fn day_embed(&self, date: NaiveDate) -> Result<ScheduleEmbed, AppError> {
        let (start, end) = day_span_millis(date, self.config.timezone)
            .ok_or_else(|| AppError::Malformed(format!("no valid local day span for {date}")))?;
        let raw = self.agenda.fetch_agenda(start, end).await?;
        let courses = canonical_order(filter_courses(raw));
        Ok(ScheduleEmbed::for_day(date, &courses))
    }
}

#[async_trait]
impl EventHandler for AgendaHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, "Discord bot connected");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(rest) = msg.content.trim().strip_prefix(COMMAND_PREFIX) else {
            return;
        };
        let keyword = rest.trim();

        let now = Utc::now().with_timezone(&self.config.timezone);
        let date = if keyword == self.config.keyword_today {
            now.date_naive()
        } else if keyword.is_empty() || keyword == self.config.keyword_tomorrow {
            // Default mirrors the scheduled evening post: tomorrow.
            now.date_naive() + Days::new(1)
        } else {
            let usage = format!(
                "Usage: `{COMMAND_PREFIX}` (demain) ou `{COMMAND_PREFIX} {}`",
                self.config.keyword_today
            );
            if let Err(e) = msg.channel_id.say(&ctx.http, usage).await {
                warn!("Failed to send usage reply: {e}");
            }
            return;
        };

        match self.day_embed(date).await {
            Ok(embed) => {
                let builder = CreateMessage::new().embed(embed.to_create_embed());
                if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
                    warn!("Failed to send agenda reply: {e}");
                }
            }
            Err(e) => {
                warn!("On-demand agenda query failed: {e}");
                let reply = format!("\u{26a0}\u{fe0f} Impossible de récupérer l'agenda : {e}");
                if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
                    warn!("Failed to send error reply: {e}");
                }
            }
        }
    }
}
