//! Cadence CLI
//!
//! Command-line interface for studying a deck of items stored as a JSON file.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;

use cadence_core::{
    BaseScheduler, EngineConfig, Feedback, PracticeState, ReviewEntry, TrainingRecord,
};

/// Cadence - Spaced Repetition CLI
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Study a spaced-repetition deck from the terminal")]
#[command(long_about = "Cadence schedules reviews with the SM-2 algorithm.\n\nThe deck is a JSON array of practice states; every command reads it and `review` writes it back.")]
struct Cli {
    /// Deck file (defaults to deck.json in the platform data directory)
    #[arg(long, global = true)]
    deck: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add new items to the deck (existing ids are kept as they are)
    Init {
        /// Item identifiers
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Record an answer and reschedule the item
    Review {
        /// Item identifier
        item_id: String,
        /// forgot, hard, good or easy
        feedback: String,
        /// Time taken to answer, in milliseconds
        #[arg(long, default_value = "0")]
        response_ms: u64,
    },

    /// List items due now, most urgent first
    Due {
        /// Show at most this many items
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show how many items fall due on each coming day
    Forecast {
        /// Number of days to show
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Show the current daily review streak
    Streak,

    /// Show the estimated retention of every reviewed item
    Retention,

    /// Summarise the training telemetry file
    Telemetry {
        /// Telemetry file (defaults to CADENCE_TELEMETRY_PATH or the platform data directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let deck = match cli.deck {
        Some(path) => path,
        None => default_deck_path()?,
    };

    match cli.command {
        Commands::Init { ids } => run_init(&deck, ids),
        Commands::Review {
            item_id,
            feedback,
            response_ms,
        } => run_review(&deck, &item_id, &feedback, response_ms),
        Commands::Due { limit } => run_due(&deck, limit),
        Commands::Forecast { days } => run_forecast(&deck, days),
        Commands::Streak => run_streak(&deck),
        Commands::Retention => run_retention(&deck),
        Commands::Telemetry { path } => run_telemetry(path),
    }
}

fn default_deck_path() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "cadence", "core")
        .context("could not determine a data directory, pass --deck")?;
    Ok(dirs.data_dir().join("deck.json"))
}

// ============================================================================
// DECK FILE
// ============================================================================

fn load_deck(path: &Path) -> anyhow::Result<Vec<PracticeState>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read deck {}", path.display()))?;
    let deck: Vec<PracticeState> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid deck file", path.display()))?;
    for state in &deck {
        state
            .validate()
            .with_context(|| format!("invalid state for item '{}'", state.item_id))?;
    }
    Ok(deck)
}

fn save_deck(path: &Path, deck: &[PracticeState]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(deck)?;
    fs::write(path, json).with_context(|| format!("failed to write deck {}", path.display()))?;
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_init(deck_path: &Path, ids: Vec<String>) -> anyhow::Result<()> {
    let scheduler = BaseScheduler::new();
    let mut deck = load_deck(deck_path)?;
    let mut known: HashSet<String> = deck.iter().map(|s| s.item_id.clone()).collect();

    let mut added = 0;
    for id in ids {
        let id = id.trim().to_string();
        if id.is_empty() || !known.insert(id.clone()) {
            continue;
        }
        deck.push(scheduler.create_item(id));
        added += 1;
    }
    save_deck(deck_path, &deck)?;

    println!(
        "{} {} new item(s), {} in deck",
        "Added".green().bold(),
        added,
        deck.len()
    );
    println!("{}: {}", "Deck".white().bold(), deck_path.display());
    Ok(())
}

fn run_review(
    deck_path: &Path,
    item_id: &str,
    feedback: &str,
    response_ms: u64,
) -> anyhow::Result<()> {
    let feedback: Feedback = feedback.parse()?;
    let scheduler = BaseScheduler::new();
    let mut deck = load_deck(deck_path)?;

    let Some(state) = deck.iter_mut().find(|s| s.item_id == item_id) else {
        bail!("item '{}' is not in {}", item_id, deck_path.display());
    };

    let now = Utc::now();
    let quality = scheduler.feedback_to_quality(feedback);
    let result = scheduler.update_at(state, quality, now);
    let mut next = result.state;
    next.push_review(ReviewEntry::new(now, quality, response_ms));
    *state = next.clone();
    save_deck(deck_path, &deck)?;

    println!("{}", "=== Review Recorded ===".cyan().bold());
    println!("{}: {}", "Item".white().bold(), next.item_id);
    println!(
        "{}: {} (quality {})",
        "Feedback".white().bold(),
        feedback,
        quality.value()
    );
    println!(
        "{}: {} -> {} day(s)",
        "Interval".white().bold(),
        result.previous_interval,
        next.interval
    );
    println!("{}: {:.2}", "Ease Factor".white().bold(), next.ease_factor);
    println!(
        "{}: {}",
        "Next Review".white().bold(),
        next.next_review_date.format("%Y-%m-%d %H:%M")
    );
    if result.should_review_again {
        println!("{}", "Forgotten - review it again this session.".yellow());
    }
    Ok(())
}

fn run_due(deck_path: &Path, limit: Option<usize>) -> anyhow::Result<()> {
    let deck = load_deck(deck_path)?;
    let now = Utc::now();
    let due = BaseScheduler::new().due_items(&deck, now);

    println!("{}", "=== Due Items ===".cyan().bold());
    if due.is_empty() {
        println!("{}", "Nothing due. Come back later.".dimmed());
        return Ok(());
    }

    let shown = limit.unwrap_or(due.len());
    for state in due.iter().take(shown) {
        let overdue_days = (now - state.next_review_date).num_hours() as f64 / 24.0;
        println!(
            "  {:<24} {}  {}",
            state.item_id.white().bold(),
            format!("ease {:.2}", state.ease_factor).dimmed(),
            if overdue_days >= 1.0 {
                format!("{:.1} day(s) overdue", overdue_days).red().to_string()
            } else {
                "due".green().to_string()
            }
        );
    }
    if due.len() > shown {
        println!("{}", format!("  ... and {} more", due.len() - shown).dimmed());
    }
    Ok(())
}

fn run_forecast(deck_path: &Path, days: u32) -> anyhow::Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let deck = load_deck(deck_path)?;
    let forecast = BaseScheduler::new().forecast(&deck, days);
    let peak = forecast.iter().map(|d| d.due).max().unwrap_or(0).max(1);

    println!("{}", "=== Review Forecast ===".cyan().bold());
    for day in &forecast {
        let width = day.due * 30 / peak;
        println!(
            "  {}  {:>4}  {}",
            day.date.format("%a %Y-%m-%d"),
            day.due,
            "#".repeat(width).blue()
        );
    }
    let total: usize = forecast.iter().map(|d| d.due).sum();
    println!("{}: {}", "Total".white().bold(), total);
    Ok(())
}

fn run_streak(deck_path: &Path) -> anyhow::Result<()> {
    let deck = load_deck(deck_path)?;
    let streak = BaseScheduler::new().streak(&deck);

    if streak == 0 {
        println!("{}", "No active streak. Review something today!".dimmed());
    } else {
        println!(
            "{} {} day(s)",
            "Current streak:".white().bold(),
            streak.to_string().green().bold()
        );
    }
    Ok(())
}

fn run_retention(deck_path: &Path) -> anyhow::Result<()> {
    let deck = load_deck(deck_path)?;
    let scheduler = BaseScheduler::new();

    println!("{}", "=== Estimated Retention ===".cyan().bold());
    let mut rows: Vec<(&PracticeState, f64)> = deck
        .iter()
        .filter_map(|state| {
            state
                .last_review_date()
                .map(|last| (state, scheduler.estimate_retention(state, last)))
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "No reviewed items yet.".dimmed());
        return Ok(());
    }
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (state, retention) in rows {
        let pct = format!("{:>5.1}%", retention * 100.0);
        let pct = if retention >= 0.9 {
            pct.green()
        } else if retention >= 0.6 {
            pct.yellow()
        } else {
            pct.red()
        };
        println!("  {}  {}", pct, state.item_id);
    }
    Ok(())
}

fn run_telemetry(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(p) => p,
        None => EngineConfig::from_env()
            .resolved_telemetry_path()
            .context("could not determine the telemetry file, pass --path")?,
    };
    if !path.exists() {
        println!("{}", format!("No telemetry at {}", path.display()).dimmed());
        return Ok(());
    }

    let file = fs::File::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = 0usize;
    let mut retained = 0usize;
    let mut malformed = 0usize;
    let mut users = HashSet::new();
    let mut items = HashSet::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TrainingRecord>(&line) {
            Ok(record) => {
                records += 1;
                if record.outcome.retained {
                    retained += 1;
                }
                users.insert(record.user_id);
                items.insert(record.item_id);
            }
            Err(_) => malformed += 1,
        }
    }

    println!("{}", "=== Training Telemetry ===".cyan().bold());
    println!("{}: {}", "File".white().bold(), path.display());
    println!("{}: {}", "Records".white().bold(), records);
    println!("{}: {}", "Learners".white().bold(), users.len());
    println!("{}: {}", "Items".white().bold(), items.len());
    if records > 0 {
        println!(
            "{}: {:.1}%",
            "Retained".white().bold(),
            retained as f64 / records as f64 * 100.0
        );
    }
    if malformed > 0 {
        println!("{}", format!("{} malformed line(s) skipped", malformed).yellow());
    }
    Ok(())
}
