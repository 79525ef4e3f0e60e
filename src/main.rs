use anyhow::Result;
use clap::Parser;
use humlyric::audio::cpal_device::{CpalCaptureDevice, list_devices};
use humlyric::cli::{Cli, Commands};
use humlyric::config::Config;
use humlyric::session::{SessionController, SessionEvents, SessionState};
use humlyric::{HttpBackend, version_string};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Devices) => {
            for name in list_devices()? {
                println!("{}", name);
            }
            Ok(())
        }
        None => run_session(cli).await,
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("humlyric={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_or_default(path),
        None => Config::default_path()
            .map(|p| Config::load_or_default(&p))
            .unwrap_or_default(),
    }
}

async fn run_session(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref());
    if let Some(url) = cli.backend_url {
        config.backend.url = url;
    }
    if let Some(device) = cli.device {
        config.audio.device = Some(device);
    }
    if let Some(genre) = cli.genre {
        config.lyrics.genre = genre;
    }

    let backend = Arc::new(HttpBackend::with_timeout(
        config.backend.url.clone(),
        Duration::from_secs(config.backend.timeout_secs),
    ));
    let device = CpalCaptureDevice::new(config.audio.device.as_deref(), config.audio.sample_rate)?;
    let (mut controller, mut events) =
        SessionController::new(backend, Box::new(device), config.lyrics.genre.clone());

    if !cli.quiet {
        eprintln!("humlyric {} — backend {}", version_string(), config.backend.url);
        eprintln!("Commands: record, stop, generate, show, pin <word>, pins,");
        eprintln!("          genre <g>, edit <draft> <line>, alts, pick <n>, close, quit");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => {
                match maybe_line? {
                    None => break,
                    Some(line) => {
                        if !handle_command(&mut controller, line.trim()) {
                            break;
                        }
                    }
                }
            }
            Some(event) = events.next() => {
                controller.apply_event(event);
                report(&controller, cli.quiet);
            }
            _ = ticker.tick() => {
                controller.poll_capture();
            }
        }
    }

    drain_pending(&mut controller, &mut events);
    Ok(())
}

/// Apply any completions that arrived while shutting down.
fn drain_pending(controller: &mut SessionController, events: &mut SessionEvents) {
    while let Some(event) = events.try_next() {
        controller.apply_event(event);
    }
}

/// Execute one REPL command. Returns false to quit.
fn handle_command(controller: &mut SessionController, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some(word) => word,
        None => return true,
    };

    let outcome = match command {
        "quit" | "exit" => return false,
        "record" => controller.start_recording().map(|()| {
            if controller.state() == SessionState::Recording {
                eprintln!("{}", "Recording… hum your melody, then type 'stop'.".green());
            }
        }),
        "stop" => controller.stop_recording().map(|()| {
            if controller.state() == SessionState::Uploading {
                eprintln!("Uploading…");
            }
        }),
        "generate" => controller.generate().map(|()| eprintln!("Generating drafts…")),
        "show" => {
            show_drafts(controller);
            Ok(())
        }
        "pin" => match words.next() {
            Some(word) => controller.toggle_pin(word),
            None => {
                eprintln!("usage: pin <word>");
                Ok(())
            }
        },
        "pins" => {
            let pinned: Vec<&str> = controller.pins().iter().collect();
            eprintln!("Pinned: {}", pinned.join(", "));
            Ok(())
        }
        "genre" => match words.next() {
            Some(genre) => {
                controller.set_genre(genre);
                Ok(())
            }
            None => {
                eprintln!("Genre: {}", controller.genre());
                Ok(())
            }
        },
        "edit" => {
            let draft = words.next().and_then(|w| w.parse::<usize>().ok());
            let line_idx = words.next().and_then(|w| w.parse::<usize>().ok());
            match (draft, line_idx) {
                (Some(draft), Some(line_idx)) => controller
                    .open_line(draft, line_idx)
                    .and_then(|()| controller.regenerate_line())
                    .map(|()| eprintln!("Fetching alternatives…")),
                _ => {
                    eprintln!("usage: edit <draft> <line>");
                    Ok(())
                }
            }
        }
        "alts" => {
            show_alts(controller);
            Ok(())
        }
        "pick" => match words.next().and_then(|w| w.parse::<usize>().ok()) {
            Some(index) => controller.apply_pick(index).map(|()| show_drafts(controller)),
            None => {
                eprintln!("usage: pick <n>");
                Ok(())
            }
        },
        "close" => {
            controller.close_line();
            Ok(())
        }
        other => {
            eprintln!("unknown command: {}", other);
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("{}", err.to_string().red());
    } else if let Some(reason) = controller.last_failure() {
        eprintln!("{}", reason.red());
    }
    true
}

/// Print the outcome of a completed exchange.
fn report(controller: &SessionController, quiet: bool) {
    if let Some(reason) = controller.last_failure() {
        eprintln!("{}", reason.red());
        return;
    }
    if quiet {
        return;
    }
    match controller.state() {
        SessionState::Transcribed => {
            if let Some(transcript) = controller.transcript() {
                eprintln!(
                    "Done! Duration {:.2} s, {} notes.",
                    transcript.duration_sec,
                    transcript.notes.len()
                );
                if !transcript.keywords.is_empty() {
                    eprintln!("Seed words: {}", transcript.keywords.join(", "));
                }
            }
        }
        SessionState::DraftsReady => {
            if controller.alt_candidates().is_some() {
                show_alts(controller);
            } else if let Some(drafts) = controller.drafts() {
                eprintln!("{} drafts ready — 'show' to list them.", drafts.len());
            }
        }
        _ => {}
    }
}

fn show_drafts(controller: &SessionController) {
    match controller.drafts() {
        Some(drafts) => {
            for (draft_idx, draft) in drafts.drafts().iter().enumerate() {
                eprintln!("{}", format!("--- draft {} ---", draft_idx).bold());
                for (line_idx, line) in draft.lines().enumerate() {
                    eprintln!("  {:>2}  {}", line_idx, line);
                }
            }
        }
        None => eprintln!("No drafts yet — 'record', 'stop', then 'generate'."),
    }
}

fn show_alts(controller: &SessionController) {
    match controller.alt_candidates() {
        Some(candidates) => {
            if candidates.alts.is_empty() {
                eprintln!("No alternatives returned; 'edit' again to retry.");
            }
            for (index, alt) in candidates.alts.iter().enumerate() {
                eprintln!("  {:>2}  {}", index, alt);
            }
        }
        None => eprintln!("No alternatives pending — 'edit <draft> <line>' first."),
    }
}
