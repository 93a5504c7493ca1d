use crate::bot;
use crate::bot::handlers::{ChatToggle, Command};
use crate::bot::views::DeepLinks;
use crate::bot::ChatSettingsCache;
use crate::config::{BotSettings, CHAT_SETTINGS_MAX_SIZE};
use filescout_core::{CatalogAggregator, InMemoryCatalog, SearchService, SessionStore};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let service = init_search_service(&settings).await;

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let links = init_deep_links(&bot, &settings).await;
    let chat_settings = Arc::new(ChatSettingsCache::new(CHAT_SETTINGS_MAX_SIZE));
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service, links, chat_settings, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_search_service(settings: &BotSettings) -> Arc<SearchService> {
    let search = settings.search.as_ref();
    let catalog = match InMemoryCatalog::load(&search.catalog_path).await {
        Ok(c) => c,
        Err(e) => {
            error!(
                "Failed to load catalog from {}: {}",
                search.catalog_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let aggregator = CatalogAggregator::new(
        Arc::new(catalog),
        search.sources(),
        search.catalog_timeout(),
    );
    let sessions = Arc::new(SessionStore::new(search.session_ceiling));
    info!(
        "Search service initialized (page size: {}, session ceiling: {}, sources: {:?})",
        search.page_size,
        search.session_ceiling,
        aggregator.sources()
    );

    Arc::new(SearchService::new(aggregator, sessions, search.page_size))
}

async fn init_deep_links(bot: &Bot, settings: &BotSettings) -> Arc<DeepLinks> {
    if let Some(name) = settings.telegram.bot_username.as_deref() {
        return Arc::new(DeepLinks::new(name));
    }
    match bot.get_me().await {
        Ok(me) => {
            let name = me.username.clone().unwrap_or_default();
            info!("Resolved bot username @{name}");
            Arc::new(DeepLinks::new(name))
        }
        Err(e) => {
            error!("Failed to query bot identity: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_search_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_search_message),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    service: Arc<SearchService>,
    chat_settings: Arc<ChatSettingsCache>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => bot::handlers::start(bot, msg).await,
        Command::Help => bot::handlers::help(bot, msg).await,
        Command::Stats => bot::handlers::stats(bot, msg, service, chat_settings).await,
        Command::Search(arg) => {
            bot::handlers::toggle(bot, msg, arg, ChatToggle::Search, chat_settings).await
        }
        Command::Autodelete(arg) => {
            bot::handlers::toggle(bot, msg, arg, ChatToggle::AutoDelete, chat_settings).await
        }
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_search_message(
    bot: Bot,
    msg: Message,
    service: Arc<SearchService>,
    links: Arc<DeepLinks>,
    chat_settings: Arc<ChatSettingsCache>,
    settings: Arc<BotSettings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::search_handlers::handle_search_message(
        bot,
        msg,
        service,
        links,
        chat_settings,
        settings,
    )
    .await
    {
        error!("Search handler error: {}", e);
    }
    respond(())
}

async fn handle_search_callback(
    bot: Bot,
    q: CallbackQuery,
    service: Arc<SearchService>,
    links: Arc<DeepLinks>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::search_handlers::handle_search_callback(bot, q, service, links).await {
        warn!("Search callback handler error: {}", e);
    }
    respond(())
}
