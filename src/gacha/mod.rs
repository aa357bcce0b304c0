//! Pack-roll and progression engine.
//! The pure pieces (catalog, pack, economy, progression, collection,
//! achievement, title) never read the clock or touch storage; `session`
//! wires them together against a `ProgressStore`.

pub mod achievement;
pub mod catalog;
pub mod collection;
pub mod economy;
pub mod errors;
pub mod pack;
pub mod progression;
pub mod session;
pub mod storage;
pub mod title;
pub mod types;

pub use achievement::{
    claim_achievement, evaluate_achievements, metric_value, progress_view, starter_achievements,
    AchievementBook, AchievementProgressView, ClaimReceipt,
};
pub use catalog::{Catalog, SHINY_ID_BASE};
pub use collection::{collection_stats, record_acquisitions, CollectionStats, RarityTally};
pub use economy::{
    accrue_passive_coins, charge_for_roll, claim_daily_bonus, heal_corruption,
    DAILY_BONUS_COINS, MAX_ACCRUAL_HOURS, MIN_ROLL_INTERVAL_MS, ROLL_COST,
};
pub use errors::GachaError;
pub use pack::{generate_pack, RandomSource, MAX_PACK_ATTEMPTS, PACK_SIZE};
pub use progression::{advance_experience, LeveledUp, LEVEL_UP_COINS};
pub use session::{GameRules, LoginSummary, RollResult, Session, SessionPool};
pub use storage::{GachaStore, GachaStoreBuilder, LeaderboardEntry, ProgressStore};
pub use title::{equip_title, owned_titles};
pub use types::*;
