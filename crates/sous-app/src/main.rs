//! Sous application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Open the SQLite session store
//! 3. Restore or start the cooking session
//! 4. Run the 1 Hz timer loop in the background
//! 5. Feed stdin transcripts through the voice controller into the session

mod cli;
mod console;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use sous_core::config::SousConfig;
use sous_core::events::SessionEvent;
use sous_core::store::SessionStore;
use sous_core::types::Recipe;
use sous_session::{lock_session, SessionManager, SharedSession, StartOutcome, Ticker};
use sous_storage::{Database, SqliteSessionStore};
use sous_voice::{dispatch, AudioBackend, Narrator, VoiceController};

use cli::{CliArgs, Command};
use console::{BellAlert, ConsoleAudio, ConsoleRecognizer};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn open_store(config: &SousConfig) -> AppResult<Arc<dyn SessionStore>> {
    let data_dir = resolve_data_dir(&config.general.data_dir);
    let db_path = data_dir.join(&config.storage.database_file);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "Session database opened");
    Ok(Arc::new(SqliteSessionStore::new(Arc::new(db))))
}

fn load_recipe(path: &Path) -> AppResult<(Recipe, String)> {
    let raw = std::fs::read_to_string(path)?;
    let recipe: Recipe = serde_json::from_str(&raw)?;
    Ok((recipe, raw))
}

/// How the cook loop voices step changes.
struct StepNarration<'a, A: AudioBackend> {
    narrator: Option<&'a Narrator<A>>,
    read_aloud: bool,
}

impl<A: AudioBackend> Clone for StepNarration<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: AudioBackend> Copy for StepNarration<'_, A> {}

/// Print session events and narrate step changes.
///
/// Every step change supersedes whatever is being spoken, whether or not
/// the new instruction is read aloud.
fn report_events<A: AudioBackend + 'static>(
    events: Vec<SessionEvent>,
    session: &SharedSession,
    narration: StepNarration<'_, A>,
) -> AppResult<bool> {
    let mut finished = false;
    for event in events {
        tracing::debug!(event = event.event_name(), "Session event");
        match event {
            SessionEvent::StepChanged { to, .. } => {
                let guard = lock_session(session)?;
                if let Some(view) = guard.view() {
                    println!("{}", console::format_view(&view));
                }
                let text = guard
                    .recipe()
                    .and_then(|r| r.step(to))
                    .map(|s| s.text.clone());
                drop(guard);
                if let Some(narrator) = narration.narrator {
                    match text.filter(|_| narration.read_aloud) {
                        Some(text) => speak(narrator, text),
                        None => silence(narrator),
                    }
                }
            }
            SessionEvent::PauseToggled { paused, .. } => {
                println!("{}", if paused { "Kitchen break. Timers frozen." } else { "Back to it." });
            }
            SessionEvent::TimerAdded { total_seconds, .. } => {
                println!("Timer set for {}", console::format_clock(total_seconds));
            }
            SessionEvent::RecipeCompleted { recipe_title, .. } => {
                println!("Finished {}. Enjoy!", recipe_title);
                finished = true;
            }
            _ => {}
        }
    }
    Ok(finished)
}

/// Queue `text` for narration. The token is taken before the task is
/// spawned so requests resolve in call order.
fn speak<A: AudioBackend + 'static>(narrator: &Narrator<A>, text: String) {
    let token = narrator.begin();
    let narrator = narrator.clone();
    tokio::spawn(async move {
        if let Err(e) = narrator.speak_with(token, &text).await {
            tracing::warn!(error = %e, "Narration failed");
        }
    });
}

/// Drop pending narration and stop playback.
fn silence<A: AudioBackend + 'static>(narrator: &Narrator<A>) {
    let token = narrator.begin();
    let narrator = narrator.clone();
    tokio::spawn(async move {
        if let Err(e) = narrator.cancel_with(token).await {
            tracing::warn!(error = %e, "Failed to stop narration");
        }
    });
}

async fn cook(config: &SousConfig, store: Arc<dyn SessionStore>, recipe_path: &Path, fresh: bool, quiet: bool) -> AppResult<()> {
    let (recipe, raw) = load_recipe(recipe_path)?;

    let mut manager = SessionManager::restore(store);
    if fresh {
        manager.reset_session();
    }
    let outcome = manager.begin(recipe, Some(raw));
    if let Some(view) = manager.view() {
        let verb = match outcome {
            StartOutcome::Started => "Starting",
            StartOutcome::Resumed => "Resuming",
        };
        println!("{} {}", verb, view.recipe_title);
        println!("{}", console::format_view(&view));
    }
    manager.drain_events();
    let session: SharedSession = Arc::new(Mutex::new(manager));

    // Timer loop.
    let ticker = Arc::new(Ticker::new(
        Arc::clone(&session),
        Arc::new(BellAlert),
        &config.timers,
    ));
    let ticker_handle = tokio::spawn({
        let ticker = Arc::clone(&ticker);
        async move { ticker.run().await }
    });

    // Narration.
    let narrator = (config.narration.enabled && !quiet).then(|| Narrator::new(Arc::new(ConsoleAudio)));
    let step_narration = StepNarration {
        narrator: narrator.as_ref(),
        read_aloud: config.narration.read_step_on_change,
    };
    if let (Some(narrator), Some(text)) = (
        narrator.as_ref(),
        lock_session(&session)?.current_instruction().map(str::to_string),
    ) {
        speak(narrator, text);
    }

    // Voice input.
    let (tx, mut events) = mpsc::unbounded_channel();
    console::spawn_stdin_reader(tx.clone());
    let mut controller = VoiceController::new(ConsoleRecognizer::new(tx), &config.voice);
    if let Err(e) = controller.start().await {
        tracing::warn!(error = %e, "Voice input unavailable");
    }

    let mut refresh = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("Input closed");
                    break;
                };
                let step_count = lock_session(&session)?.step_count();
                if let Some(command) = controller.handle_event(event, step_count).await {
                    let outcome = {
                        let mut guard = lock_session(&session)?;
                        dispatch(&mut guard, command, config.timers.add_time_seconds)
                    };
                    if let (Some(narrator), Some(text)) = (narrator.as_ref(), outcome.speech) {
                        speak(narrator, text);
                    }
                } else if let Some(partial) = controller.partial_transcript() {
                    println!("  ... {}", partial);
                }
            }
            _ = refresh.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        let pending = lock_session(&session)?.drain_events();
        if report_events(pending, &session, step_narration)? {
            break;
        }
    }

    if let Err(e) = controller.shutdown().await {
        tracing::warn!(error = %e, "Recognizer shutdown failed");
    }
    if let Some(ref narrator) = narrator {
        let _ = narrator.cancel().await;
    }
    ticker.shutdown();
    let _ = ticker_handle.await;
    lock_session(&session)?.flush();
    Ok(())
}

fn status(store: Arc<dyn SessionStore>) -> AppResult<()> {
    let manager = SessionManager::restore(store);
    let Some(view) = manager.view() else {
        println!("No cooking session.");
        return Ok(());
    };

    println!("{}", console::format_view(&view));
    println!(
        "Progress: {}/{} steps ({:.0}%)",
        view.completed_steps,
        view.step_count,
        view.progress * 100.0
    );
    if let (Some(started), Some(active)) = (manager.started_at(), manager.last_active_at()) {
        println!(
            "Started {}, last active {}",
            console::format_timestamp(started),
            console::format_timestamp(active)
        );
    }
    for timer in manager.timers() {
        println!(
            "  {:<10} {} / {}{}",
            timer.label,
            console::format_clock(timer.remaining_seconds),
            console::format_clock(timer.total_seconds),
            if timer.is_running { " running" } else { "" }
        );
    }
    Ok(())
}

fn reset(store: Arc<dyn SessionStore>) -> AppResult<()> {
    store.clear()?;
    println!("Cooking session cleared.");
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SousConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Tracing.
    let level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(path = %config_file.display(), "Starting Sous v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config)?;
    match args.command {
        Command::Cook { recipe, fresh, quiet } => cook(&config, store, &recipe, fresh, quiet).await,
        Command::Status => status(store),
        Command::Reset => reset(store),
    }
}
