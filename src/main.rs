//! Inbox console - headless operator CLI
//!
//! Inspects and drives conversations on the inbox backend using the same
//! status and messaging-window rules as the web console.

use chrono::Utc;
use inbox_console::actions::ConversationActions;
use inbox_console::api::{ConsoleBackend, HttpBackend, LoggingBackend};
use inbox_console::config::ConsoleConfig;
use inbox_console::poller::MessagePoller;
use inbox_console::window::format_remaining;
use inbox_console::{
    window_state, Conversation, ConversationStatus, MessageHistory, SenderRole, WindowState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage:
  inbox-console show <conversation-id>
  inbox-console watch <conversation-id>
  inbox-console history <conversation-id> <pages>
  inbox-console status <conversation-id> <ACTIVE|INTERVENED|NO_ANSWER|CLOSED>
  inbox-console intervene <conversation-id> <agent-id>";

enum Command {
    Show { conversation_id: String },
    Watch { conversation_id: String },
    History { conversation_id: String, pages: u32 },
    Status { conversation_id: String, target: ConversationStatus },
    Intervene { conversation_id: String, agent_id: String },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [cmd, id] if cmd == "show" => Ok(Command::Show {
            conversation_id: id.clone(),
        }),
        [cmd, id] if cmd == "watch" => Ok(Command::Watch {
            conversation_id: id.clone(),
        }),
        [cmd, id, pages] if cmd == "history" => {
            let pages = pages
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| format!("invalid page count: {pages}"))?;
            Ok(Command::History {
                conversation_id: id.clone(),
                pages,
            })
        }
        [cmd, id, status] if cmd == "status" => {
            let target = status.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Status {
                conversation_id: id.clone(),
                target,
            })
        }
        [cmd, id, agent] if cmd == "intervene" => Ok(Command::Intervene {
            conversation_id: id.clone(),
            agent_id: agent.clone(),
        }),
        _ => Err(USAGE.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inbox_console=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let config = ConsoleConfig::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        policy = ?config.transition_policy,
        "Console configured"
    );

    let backend = Arc::new(LoggingBackend::new(HttpBackend::new(&config)?));

    match command {
        Command::Show { conversation_id } => {
            let mut conversation = backend.get_conversation(&conversation_id).await?;
            let history =
                MessageHistory::load_latest(&backend, &conversation_id, config.page_size).await?;
            conversation.replace_messages(history.into_messages());
            report(&conversation);
        }
        Command::History {
            conversation_id,
            pages,
        } => {
            let mut history =
                MessageHistory::load_latest(&backend, &conversation_id, config.page_size).await?;
            while history.pages_loaded() < pages && !history.is_complete() {
                history
                    .load_older(&backend, &conversation_id, config.page_size)
                    .await?;
            }
            print_history(&history);
        }
        Command::Watch { conversation_id } => {
            let conversation = backend.get_conversation(&conversation_id).await?;
            watch(backend, conversation, &config).await;
        }
        Command::Status {
            conversation_id,
            target,
        } => {
            let mut conversation = backend.get_conversation(&conversation_id).await?;
            let actions = ConversationActions::new(backend, config.transition_policy);
            match actions.change_status(&mut conversation, target).await {
                Ok(notice) => println!("{}", notice.title),
                Err(e) => {
                    let notice = e.notice();
                    eprintln!("{}", notice.title);
                    if let Some(detail) = notice.description {
                        eprintln!("{detail}");
                    }
                    std::process::exit(1);
                }
            }
        }
        Command::Intervene {
            conversation_id,
            agent_id,
        } => {
            let mut conversation = backend.get_conversation(&conversation_id).await?;
            let actions = ConversationActions::new(backend, config.transition_policy);
            match actions.intervene(&mut conversation, &agent_id).await {
                Ok(notice) => {
                    println!("{}", notice.title);
                    if let Some(detail) = notice.description {
                        println!("{detail}");
                    }
                }
                Err(e) => {
                    let notice = e.notice();
                    eprintln!("{}", notice.title);
                    if let Some(detail) = notice.description {
                        eprintln!("{detail}");
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn report(conversation: &Conversation) {
    let allowed: Vec<_> = conversation
        .status
        .allowed_transitions()
        .iter()
        .map(|s| s.code())
        .collect();
    println!("conversation: {}", conversation.id);
    println!("customer:     {} {}", conversation.customer.name, conversation.customer.phone);
    println!("status:       {} ({})", conversation.status, conversation.status.label());
    println!("archived:     {}", conversation.archived);
    println!("transitions:  {}", allowed.join(", "));
    println!(
        "primary:      {} -> {}",
        conversation.status.primary_action_label(),
        conversation.status.primary_action()
    );
    println!("window:       {}", describe_window(window_state(&conversation.messages, Utc::now())));
}

fn print_history(history: &MessageHistory) {
    for message in history.messages() {
        let sender = match message.sender {
            SenderRole::Client => "client",
            SenderRole::Agent => "agent",
            SenderRole::Bot => "bot",
        };
        let at = match message.timestamp {
            Some(ts) => ts.to_rfc3339(),
            None => "-".to_string(),
        };
        println!("{at}  {sender:<6}  {}", message.content);
    }
    let more = if history.is_complete() {
        "start of conversation"
    } else {
        "older messages available"
    };
    println!(
        "{} messages, {} pages, {more}",
        history.messages().len(),
        history.pages_loaded()
    );
}

fn describe_window(state: WindowState) -> String {
    match state {
        WindowState::NoClientContact => "open (no client messages)".to_string(),
        WindowState::Open { remaining } => format!("open, {} left", format_remaining(remaining)),
        WindowState::Expired { since } => {
            format!("expired at {}, templates only", since.to_rfc3339())
        }
    }
}

async fn watch<B: ConsoleBackend>(backend: B, conversation: Conversation, config: &ConsoleConfig) {
    let poller = MessagePoller::new(
        backend,
        conversation.id.clone(),
        config.page_size,
        config.refresh_interval,
    );
    let cancel = CancellationToken::new();
    let mut updates = poller.subscribe();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let run = poller.run(cancel.clone());
    tokio::pin!(run);

    loop {
        tokio::select! {
            () = &mut run => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = updates.borrow_and_update().clone();
                let state = window_state(&messages, Utc::now());
                tracing::info!(
                    conversation_id = %conversation.id,
                    messages = messages.len(),
                    status = %conversation.status,
                    primary_action = %conversation.status.primary_action(),
                    outside_window = state.is_outside(),
                    window = %describe_window(state),
                    "Conversation refreshed"
                );
            }
        }
    }
}
