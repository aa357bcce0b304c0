//! # Pokeroller - pack-roll and progression engine
//!
//! Pokeroller powers a Pokémon collection game: users spend coins to open
//! five-card packs, fill their Pokédex, level up, and claim achievements
//! that pay coins and unlock cosmetic titles.
//!
//! ## Features
//!
//! - **Weighted packs**: Per-slot shiny check, legendary coin-flip and a fixed rarity ticket pool.
//! - **Coin economy**: One coin per roll, hourly passive accrual, daily login bonus, hard cap of 24.
//! - **Progression**: Flat 25 XP levels paying a level-up bonus.
//! - **Achievements & titles**: Monotonic locked → completed → claimed lifecycle.
//! - **Anti-cheat repairs**: Impossible persisted values are clamped and reported.
//! - **Persistence**: Sled-backed store with schema-versioned bincode records and a leaderboard.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use pokeroller::config::Config;
//! use pokeroller::gacha::{GachaStore, SessionPool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let rules = Arc::new(config.load_rules()?);
//!     let store = Arc::new(GachaStore::open(config.storage.db_path())?);
//!     let pool = SessionPool::new(rules, store);
//!
//!     let handle = pool.session("ash", Utc::now())?;
//!     let mut session = handle.lock().expect("session lock");
//!     session.login(Utc::now());
//!     let result = session.roll(&mut rand::thread_rng(), Utc::now())?;
//!     println!("{} cards, {} coins left", result.cards.len(), result.coins_after);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`gacha`] - Engine: catalog, pack generator, economy, progression, achievements, sessions, storage
//! - [`config`] - TOML configuration
//! - [`validation`] - User id validation
//! - [`logutil`] - Single-line log escaping

pub mod config;
pub mod gacha;
pub mod logutil;
pub mod validation;
