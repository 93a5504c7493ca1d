//! Search UI components
//!
//! Turns a [`PageView`] into Telegram HTML and an inline keyboard, and holds
//! every user-facing text of the search feature.

use filescout_core::catalog::FileRecord;
use filescout_core::service::PageView;
use filescout_core::token::{CLOSE_CALLBACK, PAGES_CALLBACK};
use filescout_core::utils::{human_size, truncate_str};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Longest file name rendered before truncation.
pub const MAX_FILE_NAME_CHARS: usize = 120;

// ─────────────────────────────────────────────────────────────────────────────
// Trait definition
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for search UI text rendering
pub trait SearchView {
    /// Greeting for /start
    fn welcome_message(first_name: &str) -> String;

    /// Command overview for /help
    fn help_message() -> &'static str;

    /// Transient notice when nothing matched
    fn no_results(query: &str) -> String;

    /// Alert when a follow-up page is empty
    fn no_more_pages() -> &'static str;

    /// Alert when the session was evicted
    fn session_expired() -> &'static str;

    /// Alert when someone else's button was clicked
    fn not_for_you() -> &'static str;

    /// Alert for undecodable callback data
    fn malformed_request() -> &'static str;

    /// Reply for admin-only commands used by non-admins
    fn admin_only() -> &'static str;

    /// Reply for group-only commands used elsewhere
    fn group_only() -> &'static str;

    /// Usage hint for an on/off toggle command
    fn toggle_usage(command: &str) -> String;

    /// Confirmation of the search toggle
    fn search_toggled(enabled: bool) -> String;

    /// Confirmation of the auto-delete toggle
    fn auto_delete_toggled(enabled: bool) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Default English implementation of `SearchView`
pub struct DefaultSearchView;

impl SearchView for DefaultSearchView {
    fn welcome_message(first_name: &str) -> String {
        format!(
            "👋 Hi <b>{}</b>!\n\n\
             Send me the name of a file and I will search every catalog for it.\n\
             Use the buttons under the results to page through them or switch the source.",
            html_escape::encode_text(first_name)
        )
    }

    fn help_message() -> &'static str {
        "<b>How to search</b>\n\
         Just type a file name, e.g. <code>batman 2005</code>.\n\n\
         <b>Group admin commands</b>\n\
         /search on|off - enable or disable search in this group\n\
         /autodelete on|off - delete results after a while\n\n\
         /stats - search statistics"
    }

    fn no_results(query: &str) -> String {
        format!("❌ No results for <b>{}</b>", html_escape::encode_text(query))
    }

    fn no_more_pages() -> &'static str {
        "❌ No more pages!"
    }

    fn session_expired() -> &'static str {
        "❌ Search expired! Search again."
    }

    fn not_for_you() -> &'static str {
        "❌ Not for you!"
    }

    fn malformed_request() -> &'static str {
        "❌ Error!"
    }

    fn admin_only() -> &'static str {
        "⚠️ Only group admins can change this."
    }

    fn group_only() -> &'static str {
        "⚠️ This command only works in groups."
    }

    fn toggle_usage(command: &str) -> String {
        format!("Usage: <code>/{command} on</code> or <code>/{command} off</code>")
    }

    fn search_toggled(enabled: bool) -> String {
        format!("✅ Search is now <b>{}</b>", on_off(enabled))
    }

    fn auto_delete_toggled(enabled: bool) -> String {
        format!("✅ Auto-delete is now <b>{}</b>", on_off(enabled))
    }
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ENABLED"
    } else {
        "DISABLED"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Builds `?start=` deep links that hand a file out in private chat.
#[derive(Debug, Clone)]
pub struct DeepLinks {
    bot_username: String,
}

impl DeepLinks {
    /// Links for the bot `bot_username` (without `@`).
    #[must_use]
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into().trim_start_matches('@').to_string(),
        }
    }

    /// Retrieval link for `record` found in `chat_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filescout_core::catalog::FileRecord;
    /// use filescout_core::source::Source;
    /// use filescout_transport_telegram::bot::views::DeepLinks;
    ///
    /// let record = FileRecord {
    ///     id: "abc".into(),
    ///     name: "a.mkv".into(),
    ///     size: 1,
    ///     source: Source::Primary,
    /// };
    /// let links = DeepLinks::new("@scout_bot");
    /// assert_eq!(
    ///     links.file_link(-100, &record),
    ///     "https://t.me/scout_bot?start=file_-100_abc"
    /// );
    /// ```
    #[must_use]
    pub fn file_link(&self, chat_id: i64, record: &FileRecord) -> String {
        format!(
            "https://t.me/{}?start=file_{chat_id}_{}",
            self.bot_username, record.id
        )
    }
}

/// HTML caption of a result page.
#[must_use]
pub fn render_results(view: &PageView, links: &DeepLinks) -> String {
    let items: Vec<String> = view
        .records
        .iter()
        .map(|record| {
            format!(
                "📁 <a href=\"{}\">[{}] {}</a>",
                html_escape::encode_double_quoted_attribute(
                    &links.file_link(view.session_key.chat_id, record)
                ),
                human_size(record.size),
                html_escape::encode_text(truncate_str(&record.name, MAX_FILE_NAME_CHARS))
            )
        })
        .collect();

    format!(
        "<b>👑 Search: {}\n\
         🎬 Total: {}\n\
         📚 Source: {}\n\
         📄 Page: {}/{}</b>\n\n\
         {}",
        html_escape::encode_text(&view.query),
        view.total,
        view.source.as_str().to_uppercase(),
        view.page_index,
        view.total_pages,
        items.join("\n\n")
    )
}

/// Inline keyboard of a result page: navigation, sources, close.
#[must_use]
pub fn results_keyboard(view: &PageView) -> InlineKeyboardMarkup {
    let mut nav = Vec::with_capacity(3);
    if let Some(offset) = view.prev_offset {
        nav.push(InlineKeyboardButton::callback(
            "« Prev",
            view.nav_token(offset).encode(),
        ));
    }
    nav.push(InlineKeyboardButton::callback(
        format!("📄 {}/{}", view.page_index, view.total_pages),
        PAGES_CALLBACK,
    ));
    if let Some(offset) = view.next_offset {
        nav.push(InlineKeyboardButton::callback(
            "Next »",
            view.nav_token(offset).encode(),
        ));
    }

    let sources = view
        .available_sources
        .iter()
        .map(|source| {
            let tick = if *source == view.source { "✅" } else { "📂" };
            InlineKeyboardButton::callback(
                format!("{tick} {}", source.title()),
                view.switch_token(*source).encode(),
            )
        })
        .collect();

    InlineKeyboardMarkup::new(vec![
        nav,
        sources,
        vec![InlineKeyboardButton::callback("❌ Close", CLOSE_CALLBACK)],
    ])
}
