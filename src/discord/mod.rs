pub mod embed;
pub mod handler;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serenity::builder::{CreateMessage, GetMessages};
use serenity::http::{Http, HttpError};
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, MessageId, UserId};
use tracing::debug;

use crate::discord::embed::ScheduleEmbed;
use crate::error::AppError;

/// A message to post in the schedule channel.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embed: Option<ScheduleEmbed>,
}

/// The metadata the recovery scan matches on.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: u64,
    pub from_self: bool,
    pub content: String,
    pub embed_author: Option<String>,
}

/// Message operations against the single schedule channel.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<u64, AppError>;

    /// Deleting an id that is already gone is not an error.
    async fn delete(&self, message_id: u64) -> Result<(), AppError>;

    async fn fetch(&self, message_id: u64) -> Result<Option<ChannelMessage>, AppError>;

    async fn recent_messages(&self, limit: u8) -> Result<Vec<ChannelMessage>, AppError>;
}

/// `ChannelPort` over the Discord REST API.
pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
    bot_id: OnceLock<UserId>,
}

impl DiscordChannel {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId::new(channel_id),
            bot_id: OnceLock::new(),
        }
    }

    /// Our own user id, resolved once and cached so `from_self` does not
    /// cost a round trip per message.
    async fn bot_user_id(&self) -> Result<UserId, AppError> {
        if let Some(id) = self.bot_id.get() {
            return Ok(*id);
        }
        let user = self.http.get_current_user().await?;
        let _ = self.bot_id.set(user.id);
        Ok(user.id)
    }

    fn to_channel_message(&self, bot_id: UserId, message: &Message) -> ChannelMessage {
        ChannelMessage {
            id: message.id.get(),
            from_self: message.author.id == bot_id,
            content: message.content.clone(),
            embed_author: message
                .embeds
                .first()
                .and_then(|embed| embed.author.as_ref())
                .map(|author| author.name.clone()),
        }
    }
}

/// Discord answers 404 for messages that were already deleted.
fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

#[async_trait]
impl ChannelPort for DiscordChannel {
    async fn send(&self, message: OutboundMessage) -> Result<u64, AppError> {
        let mut builder = CreateMessage::new();
        if let Some(content) = message.content {
            builder = builder.content(content);
        }
        if let Some(embed) = message.embed {
            builder = builder.embed(embed.to_create_embed());
        }
        let sent = self.channel_id.send_message(&self.http, builder).await?;
        Ok(sent.id.get())
    }

    async fn delete(&self, message_id: u64) -> Result<(), AppError> {
        match self
            .channel_id
            .delete_message(&self.http, MessageId::new(message_id))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!(message_id, "Message already gone");
                Ok(())
            }
            Err(e) => Err(AppError::Discord(e)),
        }
    }

    async fn fetch(&self, message_id: u64) -> Result<Option<ChannelMessage>, AppError> {
        let bot_id = self.bot_user_id().await?;
        match self
            .channel_id
            .message(&self.http, MessageId::new(message_id))
            .await
        {
            Ok(message) => Ok(Some(self.to_channel_message(bot_id, &message))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(AppError::Discord(e)),
        }
    }

    async fn recent_messages(&self, limit: u8) -> Result<Vec<ChannelMessage>, AppError> {
        let bot_id = self.bot_user_id().await?;
        let messages = self
            .channel_id
            .messages(&self.http, GetMessages::new().limit(limit))
            .await?;
        Ok(messages
            .iter()
            .map(|message| self.to_channel_message(bot_id, message))
            .collect())
    }
}
