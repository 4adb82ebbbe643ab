use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::Mutex;

use chanlog_core::{
    config::Config,
    logger::ChannelLogger,
    messaging::{
        port::{MessagingPort, UserDirectory},
        throttled::ThrottledMessenger,
    },
    security::RateLimiter,
    template::namespace_of,
    welcome::WelcomeStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub logger: Arc<ChannelLogger>,
    pub messenger: Arc<dyn MessagingPort>,
    pub users: Arc<dyn UserDirectory>,
    pub welcome: Arc<WelcomeStore>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!("chanlog started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }
    tracing::info!(
        log_channel = cfg.log_channel_id.0,
        welcome_chats = cfg.welcome_chats.len(),
        allowed_users = cfg.telegram_allowed_users.len(),
        "configuration loaded"
    );

    // Throttle everything that posts; the user directory only reads.
    let raw = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_message_limit,
    ));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(ThrottledMessenger::new(raw.clone(), cfg.throttle));
    let users: Arc<dyn UserDirectory> = raw;

    let logger = Arc::new(ChannelLogger::new(
        messenger.clone(),
        cfg.log_channel_id,
        &namespace_of(module_path!()),
    ));
    let welcome = Arc::new(WelcomeStore::load(cfg.welcome_file.clone())?);

    // Startup notice doubles as a check that the log channel is writable.
    if let Err(e) = logger.log("chanlog started", None).await {
        tracing::error!("cannot write to log channel {}: {e}", cfg.log_channel_id.0);
    }

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        logger,
        messenger,
        users,
        welcome,
        rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
            cfg.rate_limit_enabled,
            cfg.rate_limit_requests,
            cfg.rate_limit_window,
        ))),
    });

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
