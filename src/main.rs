mod config;
mod telegram_log;
mod tutor;

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use tutor::{IncomingMessage, TelegramClient, TranslationClient, TutorConfig, TutorEngine, TutorEvent, Vocabulary};

/// Inbound messages waiting for the engine. The dispatcher waits when full.
const EVENT_QUEUE_CAPACITY: usize = 256;

struct BotState {
    events: mpsc::Sender<TutorEvent>,
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);
    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("tutor.log"));
    let (file_writer, _guard) = match log_file {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            (None, None)
        }
    };

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
        }));

    if let Some(log_chat_id) = config.log_chat_id {
        let tg_layer = telegram_log::TelegramLogLayer::new(telegram.clone(), log_chat_id.0);
        registry.with(tg_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting wortschatz...");
    match bot.get_me().await {
        Ok(me) => info!("Bot user ID: {}, username: @{}", me.id, me.username()),
        Err(e) => warn!("Failed to get bot info: {e}"),
    }
    match config.lesson_chat_id {
        Some(chat_id) => info!("Daily lessons go to chat {}", chat_id),
        None => info!("Daily lessons disabled (no LESSON_CHAT_ID)"),
    }

    let vocabulary = Vocabulary::load_or_empty(&config.vocabulary_path);
    let tutor_config = TutorConfig {
        lesson_chat_id: config.lesson_chat_id.map(|id| id.0),
    };
    let engine = TutorEngine::new(tutor_config, vocabulary, telegram, Arc::new(TranslationClient::new()));

    let (events, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    tokio::spawn(engine.run(rx));
    tutor::schedule::spawn_daily_lessons(events.clone());

    let state = Arc::new(BotState { events });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(incoming) = telegram_to_incoming(&msg) else {
        return Ok(());
    };
    if incoming.is_bot {
        return Ok(());
    }

    if state.events.send(TutorEvent::Message(incoming)).await.is_err() {
        warn!("Tutor engine is gone, dropping message {}", msg.id);
    }

    Ok(())
}

fn telegram_to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    let display_name = user
        .username
        .as_deref()
        .unwrap_or(&user.first_name)
        .to_string();

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        user_id: user.id.0 as i64,
        display_name,
        is_bot: user.is_bot,
        text: text.to_string(),
    })
}
