use anyhow::{Context, Result};
use confide::messages::{Message, MessageKind, Sender};
use confide::service::{GeminiClient, GeminiConfig, ResponseServiceClient};
use confide::session::{SessionController, SessionEvent};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confide=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Confide session shell");

    // The only place the environment is read; the core gets the key via config.
    let api_key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .context("GEMINI_API_KEY (or API_KEY) must be set")?;

    let client = Arc::new(GeminiClient::new(GeminiConfig::new(api_key.into()))?);
    let session = SessionController::new(Arc::clone(&client));

    #[cfg(feature = "audio-io")]
    let playback = confide::audio::AudioPlaybackController::new(
        Arc::clone(&client),
        Arc::new(confide::audio::CpalPlaybackDevice::new()?),
    );

    let mut printed = print_new_messages(&session, 0);
    println!("(/end — завершить, /reset — начать заново, /play N — озвучить, /quit — выход)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/end" => session.end_session().await,
            "/reset" => {
                session.reset();
                printed = 0;
            }
            _ if line.starts_with("/play") => {
                #[cfg(feature = "audio-io")]
                play(line, &session, &playback).await;
                #[cfg(not(feature = "audio-io"))]
                println!("! Аудио недоступно в этой сборке");
            }
            text => session.send_user_message(text).await,
        }

        while let Some(event) = session.try_recv_event() {
            match event {
                SessionEvent::SummaryFailed(notice) => println!("! {notice}"),
                SessionEvent::LifecycleChanged(lifecycle) => {
                    info!(?lifecycle, "Lifecycle changed");
                }
                SessionEvent::MessageAppended(_) => {}
            }
        }
        printed = print_new_messages(&session, printed);
    }

    Ok(())
}

/// Print messages appended since the last call; returns the new high-water mark
fn print_new_messages<C: ResponseServiceClient>(
    session: &SessionController<C>,
    printed: usize,
) -> usize {
    let messages = session.messages();
    for (i, message) in messages.iter().enumerate().skip(printed) {
        println!("{}", render(i, message));
    }
    messages.len()
}

fn render(index: usize, message: &Message) -> String {
    let who = match (message.kind, message.sender) {
        (MessageKind::Summary, _) => "рекомендации",
        (_, Sender::User) => "вы",
        (_, Sender::Bot) => "психолог",
    };
    let badge = message
        .approach
        .map(|a| format!(" [{}]", a.display_name()))
        .unwrap_or_default();
    format!("{index:>3} {who}{badge}: {}", message.text)
}

#[cfg(feature = "audio-io")]
async fn play(
    line: &str,
    session: &SessionController<GeminiClient>,
    playback: &confide::audio::AudioPlaybackController<
        GeminiClient,
        confide::audio::CpalPlaybackDevice,
    >,
) {
    let index = line
        .strip_prefix("/play")
        .map(str::trim)
        .and_then(|n| n.parse::<usize>().ok());
    let messages = session.messages();
    match index.and_then(|i| messages.get(i)) {
        Some(message) => playback.toggle(&message.text, message.id).await,
        None => println!("! Нет сообщения с таким номером"),
    }
}
