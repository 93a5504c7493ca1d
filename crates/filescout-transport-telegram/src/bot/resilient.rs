//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Sends and edits are retried on transient failures using exponential
//! backoff with jitter. "Message is not modified" is not a failure: it
//! happens whenever a user re-clicks the button of the page already shown.

use crate::config::{
    TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
};
use anyhow::Result;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardMarkup, LinkPreviewOptions, Message, MessageId, ParseMode,
    ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, warn};

/// Retries a Telegram API operation with exponential backoff and jitter.
///
/// # Errors
///
/// Returns the last error once all retries are exhausted.
///
/// # Examples
///
/// ```no_run
/// use filescout_transport_telegram::bot::resilient::retry_telegram_operation;
/// use anyhow::Result;
///
/// # async fn example() -> Result<()> {
/// let value = retry_telegram_operation(|| async { Ok::<_, anyhow::Error>(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter) // Add jitter to prevent thundering herd
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} retries: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}

/// Link previews are disabled for result messages.
#[must_use]
pub const fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Send an HTML message with automatic retry on network failures.
///
/// # Arguments
///
/// * `bot` - The Telegram bot instance
/// * `chat_id` - Target chat ID
/// * `text` - HTML message text
/// * `markup` - Optional inline keyboard
/// * `reply_to` - Message to reply to, if any
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_html_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    markup: Option<InlineKeyboardMarkup>,
    reply_to: Option<MessageId>,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview());
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        if let Some(message_id) = reply_to {
            req = req.reply_parameters(ReplyParameters::new(message_id));
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit an HTML message and its keyboard with automatic retry.
///
/// # Returns
///
/// `true` if the message changed, `false` if it already had this content.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_html_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: impl Into<String>,
    markup: InlineKeyboardMarkup,
) -> Result<bool> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let result = bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview())
            .reply_markup(markup.clone())
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!("Message {msg_id} in chat {chat_id} already up to date");
                Ok(false)
            }
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await
}

/// Delete a message, ignoring failures (already deleted, no rights).
pub async fn delete_message_quietly(bot: &Bot, chat_id: ChatId, msg_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, msg_id).await {
        debug!("Could not delete message {msg_id} in chat {chat_id}: {e}");
    }
}

/// Delete `messages` after `delay` without blocking the caller.
pub fn schedule_deletion(bot: Bot, chat_id: ChatId, messages: Vec<MessageId>, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        for msg_id in messages {
            delete_message_quietly(&bot, chat_id, msg_id).await;
        }
    });
}
