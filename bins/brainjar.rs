use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use service::streak::StreakOverview;
use service::AppContext;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "brainjar")]
#[command(about = "BrainJar command-line client")]
#[command(version)]
struct Cli {
    /// TOML configuration file. Without it `CONFIG_PATH` (or `brainjar.toml`)
    /// is read, and defaults apply when that file is absent.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show who is logged in.
    Status,
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    /// Print the 30-day activity grid, level and milestones.
    Streak,
    /// Show a conversation, optionally sending a message or following it.
    Chat {
        user_id: Uuid,
        #[arg(long)]
        send: Option<String>,
        #[arg(long)]
        watch: bool,
    },
}

fn load_config(path: Option<&str>) -> Result<configs::AppConfig> {
    let Some(path) = path else {
        return configs::AppConfig::load_and_validate();
    };
    let mut cfg = configs::load_from_file(path).with_context(|| format!("cannot load {path}"))?;
    cfg.apply_env_overrides()?;
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(cfg.logging.format);

    let run_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(event = "panic", %run_id, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(async move {
        match run(cli.command, &cfg).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    })
}

async fn run(command: Command, cfg: &configs::AppConfig) -> Result<()> {
    let ctx = AppContext::from_config(cfg).await?;
    ctx.restore().await;
    info!(event = "start", base_url = ctx.client.base_url(), authenticated = ctx.session.is_authenticated(), "client ready");

    let outcome = dispatch(&ctx, command).await;
    ctx.shutdown();
    outcome
}

async fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Status => match ctx.session.current_user() {
            Some(user) => println!("logged in as {} <{}> (id {})", user.username, user.email, user.id),
            None => println!("not logged in"),
        },
        Command::Login { email, password } => {
            let user = ctx.session.login(&email, &password).await?;
            println!("welcome back, {}", user.username);
        }
        Command::Register { username, email, password } => {
            let user = ctx.session.register(&username, &email, &password).await?;
            println!("account created for {}", user.username);
        }
        Command::Logout => {
            ctx.session.logout().await;
            println!("logged out");
        }
        Command::Streak => {
            require_login(ctx)?;
            let overview = ctx.streaks.overview(Local::now().date_naive()).await?;
            print_streak(&overview);
        }
        Command::Chat { user_id, send, watch } => {
            require_login(ctx)?;
            chat(ctx, user_id, send, watch).await?;
        }
    }
    Ok(())
}

fn require_login(ctx: &AppContext) -> Result<()> {
    if ctx.session.is_authenticated() {
        Ok(())
    } else {
        anyhow::bail!("not logged in; run `brainjar login <email> <password>` first")
    }
}

fn print_streak(overview: &StreakOverview) {
    let stats = &overview.stats;
    println!(
        "{} day streak (longest {}), {} solved today, active {:.0}% of the last 30 days",
        stats.current_streak,
        stats.longest_streak,
        stats.problems_solved_today,
        stats.activity_percentage()
    );
    println!("level: {} ({})", overview.level.label, overview.level.color);
    if let Some(days) = overview.days_to_next_level {
        println!("{days} more day(s) to the next level");
    }
    println!("{}", overview.message);
    println!();

    for week in overview.calendar.days.chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|day| {
                let mark = if day.is_active { '#' } else { '.' };
                if day.is_today {
                    format!("[{:>2}{mark}]", day.day_of_month)
                } else {
                    format!(" {:>2}{mark} ", day.day_of_month)
                }
            })
            .collect();
        println!("{}", row.join(""));
    }
    if overview.calendar.is_stale {
        println!(
            "last activity was {} day(s) before yesterday; solve a problem to start a new streak",
            overview.calendar.gap_days
        );
    }
    println!();

    for milestone in &overview.milestones {
        let mark = if milestone.achieved { "x" } else { " " };
        println!("[{mark}] {} ({} days)", milestone.title, milestone.days);
    }
}

async fn chat(ctx: &AppContext, user_id: Uuid, send: Option<String>, watch: bool) -> Result<()> {
    if let Some(text) = send {
        let sent = ctx.chat.send(user_id, &text).await?;
        println!("sent at {}", sent.created_at.with_timezone(&Local).format("%H:%M"));
    }

    if !watch {
        for message in ctx.chat.messages_with(user_id).await? {
            print_message(&message, user_id);
        }
        return Ok(());
    }

    let mut rx = ctx.chat.watch(user_id).await?;
    let mut shown = 0;
    loop {
        let thread = rx.borrow_and_update().clone();
        for message in thread.iter().skip(shown) {
            print_message(message, user_id);
        }
        shown = thread.len();

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(event = "shutdown_signal", "received Ctrl+C, closing conversation");
                break;
            }
        }
    }
    ctx.chat.close(user_id);
    Ok(())
}

fn print_message(message: &models::ChatMessage, other: Uuid) {
    let who = if message.sender_id == other { "them" } else { "you" };
    let at = message.created_at.with_timezone(&Local).format("%m-%d %H:%M");
    println!("{at} {who:>4}: {}", message.message);
}
