//! Experience and level tracking. One XP per roll regardless of pack contents.
use serde::{Deserialize, Serialize};

use crate::gacha::types::{grant_coins, UserProgress};

/// Coins paid out on every level-up.
pub const LEVEL_UP_COINS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveledUp {
    pub level: u32,
    pub coins_granted: u32,
}

/// Add one XP; crossing `xp_to_next` levels up, resets XP and pays [`LEVEL_UP_COINS`].
pub fn advance_experience(progress: &mut UserProgress) -> Option<LeveledUp> {
    progress.xp = progress.xp.saturating_add(1);
    if progress.xp < progress.xp_to_next {
        return None;
    }
    progress.level = progress.level.saturating_add(1);
    progress.xp = 0;
    let coins_granted = grant_coins(progress, LEVEL_UP_COINS);
    log::info!(
        "progression: {} reached level {}",
        progress.user_id,
        progress.level
    );
    Some(LeveledUp {
        level: progress.level,
        coins_granted,
    })
}
