//! Discord side of the messaging gateway.

use std::sync::Arc;

use async_trait::async_trait;
use blockwatch_core::{DeliveryError, MessageGateway, MessageId, SubscriberId};
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, CreateMessage, Http, MessageFlags};

/// Sends and deletes channel messages through the Discord REST API.
#[derive(Clone)]
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageGateway for DiscordGateway {
    async fn send_message(
        &self,
        to: SubscriberId,
        text: &str,
        silent: bool,
    ) -> Result<MessageId, DeliveryError> {
        let mut message = CreateMessage::new().content(text);
        if silent {
            message = message.flags(MessageFlags::SUPPRESS_NOTIFICATIONS);
        }
        let sent = ChannelId::new(to.0)
            .send_message(&self.http, message)
            .await
            .map_err(to_delivery_error)?;
        Ok(MessageId(sent.id.get()))
    }

    async fn delete_message(&self, to: SubscriberId, message: MessageId) -> Result<(), DeliveryError> {
        ChannelId::new(to.0)
            .delete_message(&self.http, serenity::MessageId::new(message.0))
            .await
            .map_err(to_delivery_error)
    }
}

fn to_delivery_error(err: serenity::Error) -> DeliveryError {
    DeliveryError::Gateway(err.to_string())
}
