//! Search handlers
//!
//! Turns plain group/private messages into searches and result-button
//! clicks into follow-up pages.

use crate::bot::handlers::get_user_id_safe;
use crate::bot::resilient::{
    delete_message_quietly, edit_html_resilient, schedule_deletion, send_html_resilient,
};
use crate::bot::views::{
    render_results, results_keyboard, DeepLinks, DefaultSearchView, SearchView,
};
use crate::bot::ChatSettingsCache;
use crate::config::BotSettings;
use anyhow::Result;
use filescout_core::session::SessionKey;
use filescout_core::token::{CLOSE_CALLBACK, PAGES_CALLBACK};
use filescout_core::validator::{is_valid_search, SearchCandidate};
use filescout_core::{SearchError, SearchService, SourceSelector};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{MaybeInaccessibleMessage, MessageEntityKind};
use tracing::{debug, error, info, warn};

/// Describes `msg` for the query validator.
#[must_use]
pub fn candidate_from_message(msg: &Message) -> SearchCandidate<'_> {
    let has_link = msg
        .entities()
        .or_else(|| msg.caption_entities())
        .is_some_and(|entities| {
            entities.iter().any(|e| {
                matches!(
                    e.kind,
                    MessageEntityKind::Url | MessageEntityKind::TextLink { .. }
                )
            })
        });
    let has_media = msg.photo().is_some()
        || msg.video().is_some()
        || msg.document().is_some()
        || msg.audio().is_some();

    SearchCandidate {
        text: msg.text(),
        is_forward: msg.forward_origin().is_some(),
        has_media,
        has_link,
    }
}

/// Alert text shown for a failed follow-up, `None` when nothing should pop up.
#[must_use]
pub fn alert_for(err: &SearchError) -> Option<&'static str> {
    match err {
        SearchError::ValidationRejected => None,
        SearchError::NoResults { .. } => Some(DefaultSearchView::no_more_pages()),
        SearchError::SessionExpired(_) => Some(DefaultSearchView::session_expired()),
        SearchError::Unauthorized { .. } => Some(DefaultSearchView::not_for_you()),
        SearchError::MalformedToken(_) => Some(DefaultSearchView::malformed_request()),
    }
}

/// Returns `true` when `candidate` is a query and the chat allows searching.
///
/// Only real queries count towards the skipped-search figure of disabled chats.
pub async fn admits_search(
    chat_settings: &ChatSettingsCache,
    is_private: bool,
    chat_id: i64,
    candidate: &SearchCandidate<'_>,
) -> bool {
    if !is_valid_search(candidate) {
        return false;
    }
    is_private || chat_settings.allows_search(chat_id).await
}

/// Handles a text message that may be a search query.
///
/// # Errors
///
/// Returns an error if a Telegram request fails after retries.
pub async fn handle_search_message(
    bot: Bot,
    msg: Message,
    service: Arc<SearchService>,
    links: Arc<DeepLinks>,
    chat_settings: Arc<ChatSettingsCache>,
    settings: Arc<BotSettings>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let candidate = candidate_from_message(&msg);
    if !admits_search(&chat_settings, msg.chat.is_private(), chat_id.0, &candidate).await {
        return Ok(());
    }

    let user_id = get_user_id_safe(&msg);
    let session_key = SessionKey::new(chat_id.0, msg.id.0);

    match service
        .start_search(&candidate, user_id, session_key, SourceSelector::All)
        .await
    {
        Ok(view) => {
            let text = render_results(&view, &links);
            let sent = send_html_resilient(
                &bot,
                chat_id,
                text,
                Some(results_keyboard(&view)),
                Some(msg.id),
            )
            .await?;

            let auto_delete = chat_settings.get(chat_id.0).await.auto_delete;
            if let Some(delay) = settings.telegram.auto_delete_after().filter(|_| auto_delete) {
                debug!("Results {} in chat {chat_id} expire in {delay:?}", sent.id);
                schedule_deletion(bot, chat_id, vec![sent.id, msg.id], delay);
            }
        }
        Err(SearchError::NoResults { query }) => {
            let notice = send_html_resilient(
                &bot,
                chat_id,
                DefaultSearchView::no_results(&query),
                None,
                Some(msg.id),
            )
            .await?;
            schedule_deletion(
                bot,
                chat_id,
                vec![notice.id],
                settings.telegram.notice_ttl(),
            );
        }
        Err(SearchError::ValidationRejected) => {}
        Err(e) => warn!("Unexpected search outcome in chat {chat_id}: {e}"),
    }
    Ok(())
}

/// Handles a click on a result-message button.
///
/// # Errors
///
/// Returns an error if a Telegram request fails after retries.
pub async fn handle_search_callback(
    bot: Bot,
    q: CallbackQuery,
    service: Arc<SearchService>,
    links: Arc<DeepLinks>,
) -> Result<()> {
    let actor_id = q.from.id.0.cast_signed();
    let Some(data) = q.data.as_deref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if data == PAGES_CALLBACK {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone())
            .text(DefaultSearchView::session_expired())
            .show_alert(true)
            .await?;
        return Ok(());
    };

    if data == CLOSE_CALLBACK {
        return close_results(&bot, &q, message, actor_id).await;
    }

    match service.follow_up(actor_id, data).await {
        Ok(view) => {
            let chat_id = message.chat().id;
            edit_html_resilient(
                &bot,
                chat_id,
                message.id(),
                render_results(&view, &links),
                results_keyboard(&view),
            )
            .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Err(e) => {
            match &e {
                SearchError::Unauthorized { .. }
                | SearchError::SessionExpired(_)
                | SearchError::MalformedToken(_) => {
                    debug!("Follow-up by {actor_id} refused: {e}");
                }
                _ => info!("Follow-up by {actor_id} produced no page: {e}"),
            }
            let mut answer = bot.answer_callback_query(q.id.clone());
            if let Some(text) = alert_for(&e) {
                answer = answer.text(text).show_alert(true);
            }
            if let Err(err) = answer.await {
                error!("Failed to answer callback from {actor_id}: {err}");
            }
        }
    }
    Ok(())
}

/// Deletes a result message together with the query it answered.
///
/// Only the user whose query produced the results may close them.
async fn close_results(
    bot: &Bot,
    q: &CallbackQuery,
    message: &MaybeInaccessibleMessage,
    actor_id: i64,
) -> Result<()> {
    let chat_id = message.chat().id;
    let query_msg = message.regular_message().and_then(Message::reply_to_message);

    if let Some(query_msg) = query_msg {
        let owner = get_user_id_safe(query_msg);
        if owner != 0 && owner != actor_id {
            bot.answer_callback_query(q.id.clone())
                .text(DefaultSearchView::not_for_you())
                .show_alert(true)
                .await?;
            return Ok(());
        }
    }

    bot.answer_callback_query(q.id.clone()).await?;
    delete_message_quietly(bot, chat_id, message.id()).await;
    if let Some(query_msg) = query_msg {
        delete_message_quietly(bot, chat_id, query_msg.id).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filescout_core::token::TokenError;
    use serde_json::{json, Value};

    fn message(extra: Value) -> Message {
        let mut base = json!({
            "message_id": 31,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Ann"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ann"}
        });
        if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
            base.extend(extra);
        }
        serde_json::from_value(base).expect("valid message json")
    }

    #[test]
    fn plain_text_is_a_bare_candidate() {
        let msg = message(json!({"text": "batman begins"}));
        assert_eq!(
            candidate_from_message(&msg),
            SearchCandidate::text("batman begins")
        );
    }

    #[test]
    fn forwarded_text_is_flagged() {
        let msg = message(json!({
            "text": "batman begins",
            "forward_origin": {
                "type": "user",
                "date": 1_699_999_000,
                "sender_user": {"id": 7, "is_bot": false, "first_name": "Bob"}
            }
        }));
        let candidate = candidate_from_message(&msg);
        assert!(candidate.is_forward);
        assert!(!candidate.has_media);
        assert!(!candidate.has_link);
        assert!(!is_valid_search(&candidate));
    }

    #[test]
    fn url_entity_is_flagged() {
        let msg = message(json!({
            "text": "see https://example.com",
            "entities": [{"type": "url", "offset": 4, "length": 19}]
        }));
        let candidate = candidate_from_message(&msg);
        assert!(candidate.has_link);
        assert!(!candidate.is_forward);
    }

    #[test]
    fn text_link_entity_is_flagged() {
        let msg = message(json!({
            "text": "batman",
            "entities": [{
                "type": "text_link",
                "offset": 0,
                "length": 6,
                "url": "https://example.com/"
            }]
        }));
        assert!(candidate_from_message(&msg).has_link);
    }

    #[test]
    fn photo_with_caption_is_media_and_reads_caption_entities() {
        let msg = message(json!({
            "photo": [{
                "file_id": "AgADBAAD",
                "file_unique_id": "AQADBAAD",
                "width": 90,
                "height": 60,
                "file_size": 1024
            }],
            "caption": "https://example.com",
            "caption_entities": [{"type": "url", "offset": 0, "length": 19}]
        }));
        let candidate = candidate_from_message(&msg);
        assert!(candidate.has_media);
        assert!(candidate.has_link);
        assert_eq!(candidate.text, None);
    }

    #[tokio::test]
    async fn disabled_chat_counts_only_real_queries() {
        let settings = ChatSettingsCache::new(16);
        settings.set_search_enabled(-100, false).await;

        let chatter = SearchCandidate::text("/start");
        assert!(!admits_search(&settings, false, -100, &chatter).await);
        assert_eq!(settings.skipped_count(), 0);

        let query = SearchCandidate::text("batman");
        assert!(!admits_search(&settings, false, -100, &query).await);
        assert_eq!(settings.skipped_count(), 1);

        assert!(admits_search(&settings, true, 42, &query).await);
        assert!(admits_search(&settings, false, -200, &query).await);
    }

    #[test]
    fn every_follow_up_failure_has_an_alert() {
        let key = SessionKey::new(-1, 1);
        assert_eq!(
            alert_for(&SearchError::SessionExpired(key)),
            Some("❌ Search expired! Search again.")
        );
        assert_eq!(
            alert_for(&SearchError::Unauthorized {
                requester_id: 1,
                actor_id: 2
            }),
            Some("❌ Not for you!")
        );
        assert_eq!(
            alert_for(&SearchError::NoResults {
                query: "q".to_string()
            }),
            Some("❌ No more pages!")
        );
        let malformed = SearchError::MalformedToken(TokenError::InvalidOffset("x".to_string()));
        assert!(alert_for(&malformed).is_some());
        assert_eq!(alert_for(&SearchError::ValidationRejected), None);
    }
}
