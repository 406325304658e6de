//! `emberclaw chat` — the interactive consumer loop.
//!
//! The consumer side of the streaming engine: it spawns one producer per
//! user turn, polls the event channel with a short timeout so the status
//! line keeps moving, merges completed messages into its private transcript
//! view (deduplicated by message id), and owns cancellation. Exactly one
//! producer runs per session; a detached producer is joined before the next
//! turn starts.

use crate::render::{self, DisplayMode};
use emberclaw_agent::{AgentLoop, CancelSignal, ContextBuilder, TranscriptView, TurnEvent};
use emberclaw_config::AppConfig;
use emberclaw_core::memory::MemoryReader;
use emberclaw_core::session::Session;
use emberclaw_core::skill::SkillRegistry;
use emberclaw_memory::{FileMemory, NoopMemory};
use emberclaw_providers::OpenAiCompatClient;
use emberclaw_skills::DirSkillRegistry;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Session ownership between turns: either we hold it, or a producer that
/// outlived its grace period still does.
enum TurnState {
    Ready(Session),
    Detached(JoinHandle<Session>),
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    EMBERCLAW_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    // --- Collaborators ---
    let skills: Arc<dyn SkillRegistry> = Arc::new(DirSkillRegistry::new(&config.skills.root));

    let memory: Arc<dyn MemoryReader> = match &config.memory.file {
        Some(path) => Arc::new(FileMemory::new(path)),
        None => Arc::new(NoopMemory),
    };

    let tools = Arc::new(emberclaw_tools::standard_registry(
        skills.clone(),
        config.tools.allowed_commands.clone(),
        config.tools.allowed_roots.clone(),
        config.tools.forbidden_paths.clone(),
        config.tools.shell_timeout_secs,
    ));

    let client = Arc::new(
        OpenAiCompatClient::new(
            &config.reasoning.base_url,
            config.api_key.clone().unwrap_or_default(),
            &config.reasoning.model,
        )
        .with_temperature(config.reasoning.temperature)
        .with_max_tokens(config.reasoning.max_tokens),
    );

    let context = ContextBuilder::new(memory, skills, config.memory.excerpt_chars);
    let agent = Arc::new(AgentLoop::new(client, tools, context));

    let result = match message {
        Some(text) => single_message(&agent, &config, text).await,
        None => interactive(&agent, &config).await,
    };

    // Explicit teardown of the reasoning client
    agent.shutdown().await?;
    result
}

/// One-shot mode: run a single turn and exit.
async fn single_message(
    agent: &Arc<AgentLoop>,
    config: &AppConfig,
    text: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = TranscriptView::new();
    view.push_user(&text);
    // Nothing follows a one-shot turn, so a detached producer is joined
    // here for a clean exit
    if let TurnState::Detached(handle) = run_turn(agent, config, Session::new(), &text, &mut view).await {
        let _ = handle.await;
    }
    Ok(())
}

/// Interactive mode: read lines, run turns, merge events.
async fn interactive(
    agent: &Arc<AgentLoop>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  Emberclaw — interactive mode");
    println!();
    println!("  Model:   {}", config.reasoning.model);
    println!("  Skills:  {}", config.skills.root.display());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or 'quit' to leave; Ctrl+C cancels a running turn.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = TranscriptView::new();
    let mut state = TurnState::Ready(Session::new());

    prompt();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim().to_string();
        if input.is_empty() {
            prompt();
            continue;
        }
        if matches!(input.as_str(), "exit" | "quit" | "/exit" | "/quit") {
            break;
        }

        // Single-flight: a detached producer must finish before a new turn
        let session = match state {
            TurnState::Ready(session) => session,
            TurnState::Detached(handle) => {
                println!("  (waiting for the previous turn to wind down)");
                handle.await.unwrap_or_else(|_| rebuild_session(&view))
            }
        };

        view.push_user(&input);
        state = run_turn(agent, config, session, &input, &mut view).await;

        println!();
        prompt();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

/// Drive one producer run from the consumer side.
async fn run_turn(
    agent: &Arc<AgentLoop>,
    config: &AppConfig,
    session: Session,
    user_text: &str,
    view: &mut TranscriptView,
) -> TurnState {
    let cancel = CancelSignal::new();

    // Ctrl+C flips the cooperative stop signal for this turn only
    let ctrl_c_watch = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut handle = agent
        .clone()
        .spawn_turn(session, user_text, cancel.clone());

    let poll = Duration::from_millis(config.stream.poll_interval_ms);
    let grace = Duration::from_millis(config.stream.cancel_grace_ms);
    let started = Instant::now();
    let mut mode = DisplayMode::Awaiting;
    let mut streaming_open = false;
    let mut cancelled_at: Option<Instant> = None;

    loop {
        match tokio::time::timeout(poll, handle.events.recv()).await {
            Ok(Some(event)) => {
                render::clear_status();
                match event {
                    TurnEvent::Fragment { text } => {
                        render::fragment(&text, !streaming_open);
                        streaming_open = true;
                        mode = DisplayMode::Streaming;
                    }
                    TurnEvent::Completed { message, .. } => {
                        if streaming_open {
                            render::end_fragments();
                            streaming_open = false;
                        }
                        // De-duplicate by message id before merging
                        if view.merge(message.clone()) {
                            if message.actions().is_empty() {
                                render::tool_result(&message);
                            } else {
                                render::actions(message.actions());
                            }
                        }
                        mode = if message.actions().is_empty() {
                            DisplayMode::Awaiting
                        } else {
                            DisplayMode::ToolRunning
                        };
                    }
                    TurnEvent::Failed { error } => {
                        if streaming_open {
                            render::end_fragments();
                            streaming_open = false;
                        }
                        render::error(&error);
                    }
                    TurnEvent::Finished { .. } => {}
                }
            }
            // Producer closed the channel: the turn is over
            Ok(None) => break,
            // No event inside the poll window: keep the status line moving,
            // and stop waiting once a cancelled producer overstays its grace
            Err(_) => {
                if cancel.is_cancelled() && cancelled_at.is_none() {
                    cancelled_at = Some(Instant::now());
                }
                if cancelled_at.is_some_and(|t| t.elapsed() >= grace) {
                    break;
                }
                render::status(mode, started.elapsed(), cancel.is_cancelled());
            }
        }
    }

    render::clear_status();
    ctrl_c_watch.abort();

    // Bounded wait for the producer, then proceed regardless
    match tokio::time::timeout(grace, &mut handle.handle).await {
        Ok(Ok(session)) => TurnState::Ready(session),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Producer task failed; rebuilding session from the merged view");
            TurnState::Ready(rebuild_session(view))
        }
        Err(_) => {
            eprintln!("  (turn still finishing in the background)");
            TurnState::Detached(handle.handle)
        }
    }
}

/// Best-effort session from the consumer's merged transcript copy.
///
/// The capability context lives with the producer and cannot be rebuilt from
/// display text; a rebuilt session starts with an empty one.
fn rebuild_session(view: &TranscriptView) -> Session {
    let mut session = Session::new();
    for message in view.messages() {
        session.transcript.push(message.clone());
    }
    session
}

fn prompt() {
    print!("  You > ");
    let _ = std::io::stdout().flush();
}
