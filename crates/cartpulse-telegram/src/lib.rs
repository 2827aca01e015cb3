// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram delivery adapter for Cartpulse.
//!
//! Implements [`MessageSink`] for the Telegram Bot API via teloxide:
//! HTML-formatted sends with inline keyboards, edit-in-place updates, and
//! product image batches as media groups.

use async_trait::async_trait;
use cartpulse_config::model::TelegramConfig;
use cartpulse_core::{CartpulseError, InlineButton, MessageId, MessageSink, OutboundMessage};
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto,
    ParseMode, Recipient,
};
use tracing::{debug, warn};

/// Telegram adapter implementing [`MessageSink`].
///
/// All traffic goes to the single chat configured in `telegram.chat_id`.
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    /// Creates a new Telegram sink.
    ///
    /// Requires `config.bot_token` and `config.chat_id` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, CartpulseError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            CartpulseError::Config("telegram.bot_token is required for Telegram delivery".into())
        })?;

        if token.is_empty() {
            return Err(CartpulseError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let chat_id = config
            .chat_id
            .as_deref()
            .ok_or_else(|| {
                CartpulseError::Config(
                    "telegram.chat_id is required for Telegram delivery".into(),
                )
            })?
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| CartpulseError::Config(format!("invalid telegram.chat_id: {e}")))?;

        Ok(Self {
            bot: Bot::new(token),
            chat_id,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, CartpulseError> {
        let mut request = self
            .bot
            .send_message(Recipient::Id(self.chat_id), &msg.text)
            .parse_mode(parse_mode(msg));

        if let Some(markup) = keyboard_markup(msg) {
            request = request.reply_markup(markup);
        }

        let sent = request.await.map_err(|e| CartpulseError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;

        debug!(message_id = sent.id.0, "message sent");
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn edit(
        &self,
        message_id: &MessageId,
        msg: &OutboundMessage,
    ) -> Result<(), CartpulseError> {
        let msg_id = message_id
            .0
            .parse::<i32>()
            .map(teloxide::types::MessageId)
            .map_err(|e| CartpulseError::Channel {
                message: format!("invalid message_id: {e}"),
                source: None,
            })?;

        let mut request = self
            .bot
            .edit_message_text(self.chat_id, msg_id, &msg.text)
            .parse_mode(parse_mode(msg));

        if let Some(markup) = keyboard_markup(msg) {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(e) => {
                // Re-sending identical content is not an error for us.
                if e.to_string().contains("message is not modified") {
                    debug!(message_id = msg_id.0, "edit skipped, content unchanged");
                    Ok(())
                } else {
                    Err(CartpulseError::Channel {
                        message: format!("failed to edit message: {e}"),
                        source: Some(Box::new(e)),
                    })
                }
            }
        }
    }

    async fn send_media_group(
        &self,
        image_urls: &[String],
        caption: Option<&str>,
    ) -> Result<(), CartpulseError> {
        let mut media = Vec::new();
        for (i, raw) in image_urls.iter().enumerate() {
            let url = match url::Url::parse(raw) {
                Ok(url) => url,
                Err(e) => {
                    warn!(url = %raw, error = %e, "skipping unparseable image url");
                    continue;
                }
            };
            let mut photo = InputMediaPhoto::new(InputFile::url(url));
            if i == 0 {
                if let Some(caption) = caption {
                    photo = photo.caption(caption).parse_mode(ParseMode::Html);
                }
            }
            media.push(InputMedia::Photo(photo));
        }

        if media.is_empty() {
            return Ok(());
        }

        self.bot
            .send_media_group(Recipient::Id(self.chat_id), media)
            .await
            .map_err(|e| CartpulseError::Channel {
                message: format!("failed to send media group: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(())
    }
}

fn parse_mode(msg: &OutboundMessage) -> ParseMode {
    match msg.parse_mode.as_deref() {
        Some("MarkdownV2") => ParseMode::MarkdownV2,
        _ => ParseMode::Html,
    }
}

/// Converts the channel-neutral keyboard into teloxide markup.
///
/// Buttons with an unparseable URL are dropped with a warning rather than
/// failing the whole send.
fn keyboard_markup(msg: &OutboundMessage) -> Option<InlineKeyboardMarkup> {
    let keyboard = msg.keyboard.as_ref()?;
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .iter()
        .map(|row| row.iter().filter_map(to_button).collect::<Vec<_>>())
        .filter(|row: &Vec<_>| !row.is_empty())
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

fn to_button(button: &InlineButton) -> Option<InlineKeyboardButton> {
    if let Some(ref raw) = button.url {
        match url::Url::parse(raw) {
            Ok(url) => Some(InlineKeyboardButton::url(button.text.clone(), url)),
            Err(e) => {
                warn!(url = %raw, error = %e, "dropping button with unparseable url");
                None
            }
        }
    } else {
        button
            .callback_data
            .as_ref()
            .map(|data| InlineKeyboardButton::callback(button.text.clone(), data.clone()))
    }
}
