//! Disha - Career Advisor in the Terminal
//!
//! Line-oriented surface over `disha-core`: onboarding on first run, then a
//! chat prompt with the career explorer and Skill Swipe one command away.
//!
//! # Usage
//!
//! ```bash
//! # Start (reads GEMINI_API_KEY)
//! disha
//!
//! # Different model, throwaway data directory
//! disha --model gemini-2.5-pro --data-dir /tmp/disha
//!
//! # Start over with onboarding
//! disha --reset-profile
//!
//! # Dark theme on first run
//! disha --prefer-dark true
//!
//! # Verbose logging (stderr)
//! RUST_LOG=debug disha
//! ```

mod commands;
mod render;

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{info, warn};

use disha_core::config::{load_config, load_config_from_path, ConfigOverrides};
use disha_core::onboarding::Advance;
use disha_core::{
    clear_profile, App, CareerExplorer, ChatAvailability, ChatController, ChatUpdate,
    ExplorerView, FileStore, KeyValueStore, Launch, Onboarding, SkillSwipe, SwipePhase, Tab,
    UserProfile, CAREER_CATEGORIES,
};

use commands::{Command, HELP};
use render::Renderer;

/// Disha - a friendly AI career advisor for students in India
#[derive(Parser, Debug)]
#[command(name = "disha")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DISHA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model override
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Directory for saved profile and theme
    #[arg(short = 'd', long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Use the dark theme when none is saved yet
    #[arg(long, value_name = "BOOL")]
    prefer_dark: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "DISHA_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Forget the saved profile and onboard again
    #[arg(long)]
    reset_profile: bool,
}

type Input = Lines<BufReader<Stdin>>;

/// Initialize logging with the specified level
///
/// Logs go to stderr so the conversation on stdout stays readable.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("disha={level},disha_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a prompt and read one line; `None` on end of input
async fn read_line(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    input.next_line().await.context("Failed to read stdin")
}

/// Run `exchange` while rendering the updates it produces, in order
async fn with_updates<F: Future>(
    exchange: F,
    rx: &mut mpsc::Receiver<ChatUpdate>,
    renderer: &mut Renderer<std::io::Stdout>,
) -> Result<F::Output> {
    tokio::pin!(exchange);
    loop {
        tokio::select! {
            biased;
            Some(update) = rx.recv() => renderer.render(&update)?,
            output = &mut exchange => {
                while let Ok(update) = rx.try_recv() {
                    renderer.render(&update)?;
                }
                return Ok(output);
            }
        }
    }
}

async fn run_onboarding(
    mut onboarding: Onboarding,
    input: &mut Input,
    delay: Duration,
) -> Result<Option<UserProfile>> {
    println!("Welcome to Disha! Let's get to know you. (Type /back to revisit a question.)\n");
    loop {
        let step = onboarding.step();
        println!("[{}%] {}", onboarding.progress_percent(), step.question);
        println!("      {}", step.placeholder);

        let Some(line) = read_line(input, "> ").await? else {
            return Ok(None);
        };
        if line.trim() == "/back" {
            onboarding.back();
            continue;
        }

        onboarding.set_answer(line.trim());
        match onboarding.next() {
            Advance::Step(_) => println!(),
            Advance::Blocked => println!("Please enter an answer to continue.\n"),
            Advance::Finishing => {
                println!("\nCreating your personalized profile...");
                let profile = onboarding.finish_after(delay).await?;
                return Ok(Some(profile));
            }
        }
    }
}

/// Career explorer; may leave a prompt in the relay
async fn run_careers(app: &App, input: &mut Input) -> Result<()> {
    app.router().activate(Tab::Careers);
    let mut explorer = CareerExplorer::new();

    loop {
        let choice = match explorer.view() {
            ExplorerView::Categories => {
                println!("\nCareer paths:");
                for (i, category) in CAREER_CATEGORIES.iter().enumerate() {
                    println!("  {}. {} - {}", i + 1, category.title, category.description);
                }
                read_line(input, "Pick a number (or q): ").await?
            }
            ExplorerView::Category(category) => {
                println!("\n{}:", category.title);
                for (i, career) in category.careers.iter().enumerate() {
                    println!("  {}. {} - {}", i + 1, career.title, career.description);
                }
                read_line(input, "Pick a number (b = back, q = quit): ").await?
            }
            ExplorerView::Career { career, .. } => {
                println!("\n{}\n  {}", career.title, career.description);
                read_line(input, "Plan a learning path with Disha? (y / b = back / q): ").await?
            }
        };

        let Some(choice) = choice.map(|c| c.trim().to_ascii_lowercase()) else {
            return Ok(());
        };
        match (explorer.view(), choice.as_str()) {
            (_, "q") => break,
            (_, "b") => explorer.back(),
            (ExplorerView::Career { .. }, "y") => {
                explorer.plan_learning_path(app.relay());
                break;
            }
            (ExplorerView::Categories, n) => {
                if let Some(category) = pick(CAREER_CATEGORIES, n) {
                    explorer.select_category(category.id);
                }
            }
            (ExplorerView::Category(category), n) => {
                if let Some(career) = pick(category.careers, n) {
                    explorer.select_career(career.id);
                }
            }
            (ExplorerView::Career { .. }, _) => {}
        }
    }

    if app.router().active() == Tab::Careers {
        app.router().activate(Tab::Chat);
    }
    Ok(())
}

fn pick<'a, T>(items: &'a [T], choice: &str) -> Option<&'a T> {
    let index = choice.parse::<usize>().ok()?.checked_sub(1)?;
    items.get(index)
}

/// Skill Swipe; may leave a prompt in the relay
async fn run_game(app: &App, input: &mut Input) -> Result<()> {
    app.router().activate(Tab::Games);
    let mut game = SkillSwipe::new();
    game.start();

    println!("\nSkill Swipe! Would you enjoy this? Answer y or n.");
    while let Some(card) = game.current_card() {
        let Some(answer) = read_line(input, &format!("  {} {} [y/n]: ", card.emoji, card.text)).await?
        else {
            return Ok(());
        };
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => {
                game.answer(true);
            }
            "n" | "no" => {
                game.answer(false);
            }
            _ => println!("  Please answer y or n."),
        }
    }

    if let SwipePhase::Results(skills) = game.phase() {
        if skills.is_empty() {
            println!("\nYou passed on every card. Try again any time with /game.\n");
        } else {
            println!("\nYour top skills: {}", skills.join(", "));
            let discuss = read_line(input, "Ask Disha about careers for these? [y/N]: ").await?;
            if discuss.is_some_and(|d| d.trim().eq_ignore_ascii_case("y")) {
                game.discuss(app.relay());
            }
        }
    }

    if app.router().active() == Tab::Games {
        app.router().activate(Tab::Chat);
    }
    Ok(())
}

async fn chat_loop(
    app: &mut App,
    mut chat: Option<ChatController>,
    rx: &mut mpsc::Receiver<ChatUpdate>,
    input: &mut Input,
) -> Result<()> {
    let mut renderer = Renderer::new(std::io::stdout(), app.theme());

    if let Some(chat) = chat.as_mut() {
        with_updates(chat.greet(), rx, &mut renderer).await?;
    }
    println!("Type /help for commands.\n");

    loop {
        // Relayed prompts are consumed once the chat is active again
        if app.router().active() == Tab::Chat && app.relay().has_pending() {
            match chat.as_mut() {
                Some(chat) => {
                    with_updates(chat.take_pending(app.relay()), rx, &mut renderer).await?;
                }
                None => {
                    let _ = app.relay().consume();
                    println!("Chat is unavailable, so the prompt was not sent.\n");
                }
            }
        }

        let Some(line) = read_line(input, "You: ").await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Chat(text) => match chat.as_mut() {
                Some(chat) => {
                    with_updates(chat.send(&text), rx, &mut renderer).await?;
                }
                None => println!("Chat is unavailable. Set GEMINI_API_KEY and restart.\n"),
            },
            Command::Careers => run_careers(app, input).await?,
            Command::Game => run_game(app, input).await?,
            Command::Theme => {
                let theme = app.toggle_theme();
                renderer.set_theme(theme);
                println!("Theme: {theme}\n");
            }
            Command::Tab(None) => println!("Active tab: {}\n", app.router().active()),
            Command::Tab(Some(Tab::Careers)) => run_careers(app, input).await?,
            Command::Tab(Some(Tab::Games)) => run_game(app, input).await?,
            Command::Tab(Some(Tab::Chat)) => app.router().activate(Tab::Chat),
            Command::Help => println!("{HELP}\n"),
            Command::Quit => break,
            Command::Unknown(reason) => println!("{reason}. Type /help for commands.\n"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(ref model) = args.model {
        overrides = overrides.with_model(model);
    }
    if let Some(ref dir) = args.data_dir {
        overrides = overrides.with_data_dir(dir.clone());
    }
    if let Some(dark) = args.prefer_dark {
        overrides = overrides.with_prefer_dark(dark);
    }
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        model = %config.backend.model,
        data_dir = %config.data_dir.display(),
        source = %config.source(),
        "Starting Disha"
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&config.data_dir));
    if args.reset_profile {
        clear_profile(store.as_ref()).context("Failed to reset saved profile")?;
    }

    let finish_delay = config.finish_delay;
    let (mut app, launch) = App::launch(config, store);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let (tx, mut rx) = mpsc::channel(256);

    let availability = match launch {
        Launch::Ready(profile) => {
            println!("Welcome back, {}!\n", profile.name);
            app.open_chat(tx)
        }
        Launch::Onboarding(onboarding) => {
            let Some(profile) = run_onboarding(onboarding, &mut input, finish_delay).await? else {
                return Ok(());
            };
            app.complete_onboarding(profile, tx)
        }
    };

    let chat = match availability {
        ChatAvailability::Ready(chat) => Some(chat),
        ChatAvailability::Unavailable(e) => {
            warn!(error = %e, "Chat disabled");
            println!("Chat is unavailable ({e}). Careers and Skill Swipe still work.\n");
            None
        }
    };

    chat_loop(&mut app, chat, &mut rx, &mut input).await
}
