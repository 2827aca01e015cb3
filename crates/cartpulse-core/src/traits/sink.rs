// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message sink trait.
//!
//! Everything that notifies a human goes through [`MessageSink`], so the
//! reconciler and the report runner never depend on Telegram directly and
//! tests can substitute a recording mock.

use async_trait::async_trait;

use crate::error::CartpulseError;
use crate::types::{MessageId, OutboundMessage};

/// Adapter for an outbound chat channel.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sends a new message, returning the channel's message id.
    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, CartpulseError>;

    /// Edits a previously sent message in place.
    async fn edit(
        &self,
        message_id: &MessageId,
        msg: &OutboundMessage,
    ) -> Result<(), CartpulseError>;

    /// Sends a batch of images as a single media group.
    ///
    /// Sinks without media support may treat this as a no-op.
    async fn send_media_group(
        &self,
        image_urls: &[String],
        caption: Option<&str>,
    ) -> Result<(), CartpulseError>;
}
