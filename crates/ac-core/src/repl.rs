//! Interactive terminal chat loop and one-shot batch mode.

use std::io::{self, BufRead, Write};

use tokio::runtime::Runtime;

use ac_backend::ChatClient;
use ac_protocol::{ChatRequest, Conversation, Role};

use crate::assembler::TurnPhase;
use crate::config::Config;
use crate::lead::{FileFlagStore, FlagStore, LeadGate};
use crate::session::{self, epoch_secs};
use crate::transcript::{self, Transcript, TranscriptEntry};
use crate::turn::{cancellable, run_turn, TurnOutcome};

/// Run the interactive REPL. Returns the process exit code.
pub fn run_repl(config: &Config, runtime: &Runtime) -> i32 {
    let data_dir = config.session.resolve_data_dir();
    let fingerprint = resolve_fingerprint(&data_dir);

    let mut flags = match FileFlagStore::open(data_dir.join("flags.json")) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: cannot open flag store: {e}");
            return 1;
        }
    };
    let mut gate = LeadGate::new();

    let client = build_client(config);
    let mut session_id = session::generate_session_id();
    let mut conversation = Conversation::new();
    let mut transcript = open_transcript(config, &session_id);

    println!("advisorchat — chat with a study advisor (/help for commands)");

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("you> ");
        let _ = io::stdout().flush();

        input.clear();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: failed to read input: {e}");
                return 1;
            }
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/help" => {
                print_commands();
                continue;
            }
            "/new" => {
                session_id = session::generate_session_id();
                conversation = Conversation::new();
                transcript = open_transcript(config, &session_id);
                println!("started session {session_id}");
                continue;
            }
            "/history" => {
                print_history(&conversation);
                continue;
            }
            "/sessions" => {
                print_sessions(config);
                continue;
            }
            _ => {}
        }

        let request = ChatRequest::new(line, &fingerprint, &session_id);
        let stream = client.send(&request);

        let outcome = runtime.block_on(async {
            let (cancel, events) = cancellable(stream);
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            print!("advisor> ");
            let _ = io::stdout().flush();

            let outcome = run_turn(&mut conversation, line, events, |delta| {
                print!("{delta}");
                let _ = io::stdout().flush();
            })
            .await;

            watcher.abort();
            outcome
        });
        println!();

        record_turn(transcript.as_mut(), line, &outcome);

        if config.lead.enabled {
            gate.on_turn_end(&mut flags, outcome.show_lead_form);
            gate.on_user_turn(
                &mut flags,
                conversation.user_turns(),
                config.lead.prompt_after_turns,
            );
            if gate.is_visible() {
                offer_lead_prompt(&mut gate, &mut flags, transcript.as_mut());
            }
        }
    }

    0
}

/// Run a single message non-interactively. Returns the process exit code.
pub fn run_once(config: &Config, runtime: &Runtime, message: &str) -> i32 {
    let data_dir = config.session.resolve_data_dir();
    let fingerprint = resolve_fingerprint(&data_dir);

    let client = build_client(config);
    let session_id = session::generate_session_id();
    let request = ChatRequest::new(message, &fingerprint, &session_id);
    let stream = client.send(&request);

    let mut conversation = Conversation::new();
    let outcome = runtime.block_on(run_turn(&mut conversation, message, stream, |delta| {
        print!("{delta}");
        let _ = io::stdout().flush();
    }));
    println!();

    match outcome.phase {
        TurnPhase::Failed => {
            eprintln!("error: {}", outcome.error.unwrap_or_default());
            1
        }
        _ => 0,
    }
}

fn build_client(config: &Config) -> ChatClient {
    match config.api.resolve_token() {
        Some(token) => ChatClient::with_token(&config.api.base_url, token),
        None => ChatClient::new(&config.api.base_url),
    }
}

fn resolve_fingerprint(data_dir: &std::path::Path) -> String {
    session::load_or_create_fingerprint(data_dir).unwrap_or_else(|e| {
        tracing::warn!(%e, "could not persist device fingerprint, using ephemeral id");
        format!("d{:x}", std::process::id())
    })
}

fn open_transcript(config: &Config, session_id: &str) -> Option<Transcript> {
    if !config.session.transcripts {
        return None;
    }
    match Transcript::create(&config.session.resolve_data_dir(), session_id) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!(%e, "could not open transcript, continuing without");
            None
        }
    }
}

fn record_turn(transcript: Option<&mut Transcript>, user_message: &str, outcome: &TurnOutcome) {
    let Some(transcript) = transcript else {
        return;
    };
    transcript.append(&TranscriptEntry::user(user_message));
    if !outcome.content.is_empty() {
        transcript.append(&TranscriptEntry::assistant(&outcome.content));
    }
    if let Some(error) = &outcome.error {
        transcript.append(&TranscriptEntry::error(error));
    }
}

fn print_commands() {
    println!("Commands:");
    println!("  /new       Start a fresh chat session");
    println!("  /history   Show the current conversation");
    println!("  /sessions  List stored session transcripts");
    println!("  /quit      Exit");
}

fn print_history(conversation: &Conversation) {
    if conversation.is_empty() {
        println!("no messages yet");
        return;
    }
    for message in conversation.snapshot() {
        let label = match message.role {
            Role::User => "you",
            Role::Assistant => "advisor",
        };
        println!("{label}> {}", message.content);
    }
}

fn print_sessions(config: &Config) {
    let data_dir = config.session.resolve_data_dir();
    let sessions = transcript::list_sessions(&data_dir);
    if sessions.is_empty() {
        println!("no stored sessions");
        return;
    }
    for path in sessions {
        let entries = transcript::read_transcript(&path);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{name}  ({} entries)", entries.len());
    }
}

fn offer_lead_prompt(
    gate: &mut LeadGate,
    flags: &mut dyn FlagStore,
    mut transcript: Option<&mut Transcript>,
) {
    println!();
    println!("An advisor can follow up with program recommendations.");
    print!("Share your contact details? [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        gate.dismiss(flags);
        return;
    }
    if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
        gate.dismiss(flags);
        println!("No problem — ask away.");
        return;
    }

    let name = prompt_line("Name: ");
    let email = prompt_line("Email: ");
    match (name, email) {
        (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
            if let Some(t) = transcript.as_deref_mut() {
                t.append(&TranscriptEntry::Lead {
                    ts: epoch_secs(),
                    name,
                    email,
                });
            }
            gate.submit(flags);
            println!("Thanks — an advisor will reach out shortly.");
        }
        _ => {
            gate.dismiss(flags);
            println!("Skipped.");
        }
    }
}

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().lock().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}
