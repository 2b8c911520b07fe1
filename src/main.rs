mod config;
mod health;
mod relay;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use config::ConfigStore;
use relay::{Caller, RelayEngine, TelegramClient};

type Engine = RelayEngine<TelegramClient>;

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "courier.json".to_string());

    // Setup logging: stdout plus a non-blocking file appender.
    std::fs::create_dir_all("logs").ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("logs/courier.log")
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    let store = match ConfigStore::load(&config_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    info!("🚀 Starting courier");
    info!("Loaded config from {config_path}");

    let (token, developer_name, developer_handle) = store.read(|c| {
        (c.token.clone(), c.developer.name.clone(), c.developer.telegram.clone())
    });

    let bot = Bot::new(&token);
    let transport = Arc::new(TelegramClient::new(bot.clone()));
    let engine = Arc::new(RelayEngine::new(store, transport));

    let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let health_state = health::HealthState {
        developer_name,
        developer_handle,
        started_at: chrono::Utc::now(),
    };
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_state, port).await {
            error!("Health endpoint failed: {e}");
        }
    });

    engine.announce_startup().await;

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, engine: Arc<Engine>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let caller = Caller {
        id: msg.from.as_ref().map(|u| u.id.0 as i64),
        username: msg.from.as_ref().and_then(|u| u.username.clone()),
        first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
    };
    engine.handle_text(msg.chat.id.0, &caller, text).await;
    Ok(())
}

async fn handle_callback(q: CallbackQuery, engine: Arc<Engine>) -> ResponseResult<()> {
    let chat_id = q.message.as_ref().map(|m| match m {
        MaybeInaccessibleMessage::Regular(msg) => msg.chat.id.0,
        MaybeInaccessibleMessage::Inaccessible(msg) => msg.chat.id.0,
    });
    engine.handle_callback(chat_id, &q.id.0, q.data.as_deref()).await;
    Ok(())
}
