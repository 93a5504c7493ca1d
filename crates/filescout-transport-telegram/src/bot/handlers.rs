use crate::bot::views::{DefaultSearchView, SearchView};
use crate::bot::ChatSettingsCache;
use anyhow::Result;
use filescout_core::SearchService;
use std::sync::Arc;
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};
use tracing::{info, warn};

/// Name of a message author, preferring the username.
#[must_use]
pub fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Explain how searching works
    #[command(description = "How to search.")]
    Help,
    /// Show search statistics
    #[command(description = "Show search statistics.")]
    Stats,
    /// Enable or disable search in a group
    #[command(description = "on|off - toggle search in this group.")]
    Search(String),
    /// Enable or disable auto-deletion of results in a group
    #[command(description = "on|off - toggle result auto-delete.")]
    Autodelete(String),
}

/// Parses an `on`/`off` command argument.
///
/// # Examples
///
/// ```
/// use filescout_transport_telegram::bot::handlers::parse_toggle;
/// assert_eq!(parse_toggle(" ON "), Some(true));
/// assert_eq!(parse_toggle("off"), Some(false));
/// assert_eq!(parse_toggle(""), None);
/// ```
#[must_use]
pub fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.trim().to_lowercase().as_str() {
        "on" | "enable" | "true" => Some(true),
        "off" | "disable" | "false" => Some(false),
        _ => None,
    }
}

async fn reply_html(bot: &Bot, msg: &Message, text: impl Into<String>) -> Result<()> {
    bot.send_message(msg.chat.id, text.into())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Start command handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let first_name = msg
        .from
        .as_ref()
        .map_or_else(|| get_user_name(&msg), |u| u.first_name.clone());

    info!("User {user_id} ({}) initiated /start command.", get_user_name(&msg));
    reply_html(&bot, &msg, DefaultSearchView::welcome_message(&first_name)).await
}

/// Help command handler
///
/// # Errors
///
/// Returns an error if the help message cannot be sent.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    reply_html(&bot, &msg, DefaultSearchView::help_message()).await
}

/// Stats command handler
///
/// # Errors
///
/// Returns an error if the message cannot be sent.
pub async fn stats(
    bot: Bot,
    msg: Message,
    service: Arc<SearchService>,
    chat_settings: Arc<ChatSettingsCache>,
) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("Stats command received from user {user_id}.");

    let sessions = service.sessions();
    let aggregator = service.aggregator();
    let sources: Vec<&str> = aggregator.sources().iter().map(|s| s.title()).collect();

    let stats_text = format!(
        "<b>📊 Search Statistics</b>\n\n\
        <b>Catalog:</b>\n\
        • Files indexed: {}\n\
        • Sources: {}\n\
        • Page size: {}\n\n\
        <b>Sessions:</b>\n\
        • Active: {} / {}\n\n\
        <b>Chats:</b>\n\
        • Configured: {}\n\
        • Skipped messages: {}",
        aggregator.record_count().await,
        sources.join(", "),
        service.page_size(),
        sessions.len().await,
        sessions.ceiling(),
        chat_settings.entry_count(),
        chat_settings.skipped_count()
    );

    reply_html(&bot, &msg, stats_text).await?;
    info!("Responded to stats from user {user_id}.");
    Ok(())
}

/// Which per-chat switch a toggle command flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatToggle {
    /// `/search on|off`
    Search,
    /// `/autodelete on|off`
    AutoDelete,
}

impl ChatToggle {
    const fn command(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::AutoDelete => "autodelete",
        }
    }
}

/// Handles `/search` and `/autodelete`, restricted to group admins.
///
/// # Errors
///
/// Returns an error if a Telegram request fails.
pub async fn toggle(
    bot: Bot,
    msg: Message,
    arg: String,
    which: ChatToggle,
    chat_settings: Arc<ChatSettingsCache>,
) -> Result<()> {
    let user_id = get_user_id_safe(&msg);

    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return reply_html(&bot, &msg, DefaultSearchView::group_only()).await;
    }

    let Some(enabled) = parse_toggle(&arg) else {
        return reply_html(&bot, &msg, DefaultSearchView::toggle_usage(which.command())).await;
    };

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let member = bot.get_chat_member(msg.chat.id, user.id).await?;
    if !member.is_privileged() {
        warn!(
            "User {user_id} tried /{} in chat {} without admin rights.",
            which.command(),
            msg.chat.id
        );
        return reply_html(&bot, &msg, DefaultSearchView::admin_only()).await;
    }

    let chat_id = msg.chat.id.0;
    let text = match which {
        ChatToggle::Search => {
            chat_settings.set_search_enabled(chat_id, enabled).await;
            DefaultSearchView::search_toggled(enabled)
        }
        ChatToggle::AutoDelete => {
            chat_settings.set_auto_delete(chat_id, enabled).await;
            DefaultSearchView::auto_delete_toggled(enabled)
        }
    };
    info!(
        "User {user_id} set {} = {enabled} for chat {chat_id}.",
        which.command()
    );
    reply_html(&bot, &msg, text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_arguments() {
        let cmd = Command::parse("/search off", "scout_bot").expect("parse");
        assert_eq!(cmd, Command::Search("off".to_string()));

        let cmd = Command::parse("/autodelete", "scout_bot").expect("parse");
        assert_eq!(cmd, Command::Autodelete(String::new()));

        assert_eq!(Command::parse("/stats", "scout_bot").expect("parse"), Command::Stats);
    }

    #[test]
    fn toggle_arguments() {
        assert_eq!(parse_toggle("on"), Some(true));
        assert_eq!(parse_toggle("Disable"), Some(false));
        assert_eq!(parse_toggle("maybe"), None);
    }

    #[test]
    fn toggle_command_names_match_bot_commands() {
        let names = Command::descriptions().to_string();
        assert!(names.contains(&format!("/{}", ChatToggle::Search.command())));
        assert!(names.contains(&format!("/{}", ChatToggle::AutoDelete.command())));
    }
}
