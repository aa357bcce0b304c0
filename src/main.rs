//! Binary entrypoint for the Pokeroller CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml` and a sample catalog
//! - `roll --user <id> [--count N]` - open packs
//! - `status --user <id>` - coins, level and collection summary
//! - `achievements --user <id>` - achievement progress
//! - `claim --user <id> --id <achievement>` - claim a completed achievement
//! - `equip --user <id> --title <title>` - equip an unlocked title
//! - `leaderboard [--limit N]` - top users by packs opened
//! - `delete-user --user <id>` - remove a user's progress
//!
//! See the library crate docs for module-level details: `pokeroller::`.
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use pokeroller::config::Config;
use pokeroller::gacha::{
    owned_titles, GachaError, GachaStore, Session, SessionPool, MIN_ROLL_INTERVAL_MS,
};
use pokeroller::validation::validate_user_id;

const SAMPLE_CATALOG: &str = include_str!("../data/catalog.sample.json");

#[derive(Parser)]
#[command(name = "pokeroller")]
#[command(about = "Pack-roll and progression engine for a Pokémon collection game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and sample catalog
    Init,
    /// Open one or more packs
    Roll {
        #[arg(short, long)]
        user: String,
        /// Number of packs to open
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Show a user's coins, level and collection
    Status {
        #[arg(short, long)]
        user: String,
    },
    /// Show achievement progress
    Achievements {
        #[arg(short, long)]
        user: String,
    },
    /// Claim a completed achievement's reward
    Claim {
        #[arg(short, long)]
        user: String,
        /// Achievement id (e.g. roll_50)
        #[arg(long)]
        id: String,
    },
    /// Equip an unlocked title
    Equip {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        title: String,
    },
    /// Top users by packs opened
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete a user's stored progress
    DeleteUser {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return run_init(&cli.config).await;
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);
    info!(
        "{} v{} using {}",
        config.game.name,
        env!("CARGO_PKG_VERSION"),
        config.storage.db_path().display()
    );

    let store = Arc::new(GachaStore::open(config.storage.db_path())?);

    match cli.command {
        Commands::Init => {}
        Commands::Leaderboard { limit } => {
            let rows = store.leaderboard(limit)?;
            if cli.json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No trainers yet.");
            } else {
                for (rank, row) in rows.iter().enumerate() {
                    let title = row
                        .equipped_title
                        .as_deref()
                        .map(|t| format!(" [{}]", t))
                        .unwrap_or_default();
                    println!(
                        "{:>3}. {}{} - {} packs, level {}",
                        rank + 1,
                        row.user_id,
                        title,
                        row.packs_opened,
                        row.level
                    );
                }
            }
        }
        Commands::DeleteUser { user } => {
            let user = validate_user_id(&user)?;
            if store.delete_user(&user)? {
                println!("Deleted progress for {}.", user);
            } else {
                println!("No progress stored for {}.", user);
            }
        }
        command => {
            let rules = Arc::new(config.load_rules()?);
            let pool = SessionPool::new(rules, Arc::clone(&store));
            let result = run_session_command(&pool, command, cli.json).await;
            if let Err(e) = pool.flush_all() {
                warn!("Progress could not be saved: {}", e);
            }
            result?;
        }
    }
    Ok(())
}

async fn run_init(config_path: &str) -> Result<()> {
    info!("Initializing new Pokeroller configuration");
    if Path::new(config_path).exists() {
        return Err(anyhow!(
            "Configuration file {} already exists; refusing to overwrite",
            config_path
        ));
    }
    Config::create_default(config_path).await?;
    info!("Configuration file created at {}", config_path);

    let cfg = Config::default();
    tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
    if Path::new(&cfg.catalog.path).exists() {
        info!("Keeping existing catalog at {}", cfg.catalog.path);
    } else {
        tokio::fs::write(&cfg.catalog.path, SAMPLE_CATALOG).await?;
        info!("Sample catalog written to {}", cfg.catalog.path);
    }
    Ok(())
}

type SessionHandle = Arc<Mutex<Session<GachaStore>>>;

fn lock(handle: &SessionHandle) -> Result<MutexGuard<'_, Session<GachaStore>>> {
    handle.lock().map_err(|_| anyhow!("session lock poisoned"))
}

async fn run_session_command(
    pool: &SessionPool<GachaStore>,
    command: Commands,
    json: bool,
) -> Result<()> {
    let user = match &command {
        Commands::Roll { user, .. }
        | Commands::Status { user }
        | Commands::Achievements { user }
        | Commands::Claim { user, .. }
        | Commands::Equip { user, .. } => user.clone(),
        _ => return Err(anyhow!("command does not take a session")),
    };
    let handle = pool.session(&user, Utc::now())?;

    let login = lock(&handle)?.login(Utc::now());
    if !json {
        for repair in &login.repairs {
            println!("Repaired: {}", repair);
        }
        if login.passive_coins > 0 {
            println!("+{} coins while you were away.", login.passive_coins);
        }
        if let Some(bonus) = login.daily_bonus {
            println!("Daily bonus: +{} coins.", bonus);
        }
    }

    match command {
        Commands::Roll { count, .. } => {
            let mut rng = rand::thread_rng();
            let mut results = Vec::new();
            for i in 0..count {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(MIN_ROLL_INTERVAL_MS as u64)).await;
                }
                let outcome = lock(&handle)?.roll(&mut rng, Utc::now());
                match outcome {
                    Ok(result) => {
                        if !json {
                            print_roll(&result);
                        }
                        results.push(result);
                    }
                    Err(GachaError::InsufficientFunds) => {
                        if !json {
                            println!("Out of coins after {} pack(s).", i);
                        }
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if json {
                print_json(&results)?;
            }
        }
        Commands::Status { .. } => {
            let session = lock(&handle)?;
            let stats = session.stats();
            if json {
                print_json(&stats)?;
            } else {
                let progress = session.progress();
                println!("Trainer: {}", progress.user_id);
                if let Some(title) = &progress.equipped_title {
                    println!("Title: {}", title);
                }
                println!("Coins: {}", stats.coins);
                println!(
                    "Level {} ({}/{} xp)",
                    stats.level, stats.xp, stats.xp_to_next
                );
                println!(
                    "Packs opened: {}  Cards: {}  Unique: {}",
                    stats.packs_opened, stats.total_cards, stats.unique_owned
                );
                println!(
                    "Dex: {}/{} ({:.1}%)",
                    stats.dex_owned,
                    stats.dex_size,
                    stats.dex_percent()
                );
                for (rarity, tally) in &stats.by_rarity {
                    println!(
                        "  {:<10} {:>4} unique, {:>5} copies",
                        rarity.as_str(),
                        tally.unique,
                        tally.copies
                    );
                }
                let titles = owned_titles(progress, &session.rules().achievements);
                if !titles.is_empty() {
                    println!("Titles: {}", titles.join(", "));
                }
                for catch in progress.recent_catches.iter().take(5) {
                    let marker = if catch.was_new { " NEW" } else { "" };
                    println!("  {} {} x{}{}", catch.entry_id, catch.name, catch.count, marker);
                }
            }
        }
        Commands::Achievements { .. } => {
            let views = lock(&handle)?.achievements();
            if json {
                print_json(&views)?;
            } else {
                for view in views {
                    let state = if view.claimed {
                        "claimed"
                    } else if view.ready_to_claim {
                        "ready"
                    } else if view.completed {
                        "complete"
                    } else {
                        "locked"
                    };
                    println!(
                        "{:<14} {:<22} {:>5}/{:<5} {}",
                        view.id, view.name, view.current.min(view.required), view.required, state
                    );
                }
            }
        }
        Commands::Claim { id, .. } => {
            let receipt = lock(&handle)?.claim(&id, Utc::now())?;
            if json {
                print_json(&receipt)?;
            } else {
                println!(
                    "Claimed {}: +{} coins.",
                    receipt.achievement_id, receipt.coins_granted
                );
                if let Some(title) = receipt.title_unlocked {
                    println!("Unlocked title \"{}\". Equip it with `pokeroller equip`.", title);
                }
                if let Some(warning) = &receipt.persistence_warning {
                    println!("  Warning: {}", warning);
                }
            }
        }
        Commands::Equip { title, .. } => {
            let warning = lock(&handle)?.equip(&title, Utc::now())?;
            if json {
                print_json(&serde_json::json!({ "equipped": title, "persistence_warning": warning }))?;
            } else {
                println!("Equipped title \"{}\".", title);
            }
        }
        _ => {}
    }

    if let Some(warning) = lock(&handle)?.last_persistence_warning() {
        warn!("{}", warning);
    }
    Ok(())
}

fn print_roll(result: &pokeroller::gacha::RollResult) {
    let names: Vec<String> = result
        .cards
        .iter()
        .map(|c| format!("{} ({})", c.name, c.rarity))
        .collect();
    println!("Pack: {}", names.join(", "));
    if result.new_catches > 0 {
        println!("  {} new catch(es)!", result.new_catches);
    }
    if let Some(up) = &result.leveled_up {
        println!("  Level up! Now level {} (+{} coins)", up.level, up.coins_granted);
    }
    for def in &result.newly_completed {
        println!("  {} Achievement complete: {} (claim with --id {})", def.icon, def.name, def.id);
    }
    println!("  Coins left: {}", result.coins_after);
    if let Some(warning) = &result.persistence_warning {
        println!("  Warning: {}", warning);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = Arc::new(Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
