//! Coin economy: roll charges, passive hourly accrual, daily login bonus and
//! the anti-cheat repairs applied to persisted progress.
//!
//! - One coin per roll, at most one roll per [`MIN_ROLL_INTERVAL_MS`]
//! - One coin per elapsed hour, at most [`MAX_ACCRUAL_HOURS`] hours counted per evaluation
//! - [`DAILY_BONUS_COINS`] on the first login of each calendar day
//! - Balance always within `0..=COIN_CAP`; grants saturate, debits below zero are rejected

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::gacha::errors::GachaError;
use crate::gacha::types::{
    grant_coins, UserProgress, COIN_CAP, DEFAULT_XP_TO_NEXT, RECENT_CATCHES_LIMIT,
};

pub const ROLL_COST: i32 = 1;
pub const MIN_ROLL_INTERVAL_MS: i64 = 100;
pub const MAX_ACCRUAL_HOURS: i64 = 24;
pub const DAILY_BONUS_COINS: u32 = 2;

/// Debit one roll. Fails without side effects when rolling too fast or broke.
pub fn charge_for_roll(progress: &mut UserProgress, now: DateTime<Utc>) -> Result<(), GachaError> {
    if let Some(last) = progress.last_roll_at {
        let since = now.signed_duration_since(last).num_milliseconds();
        if since < MIN_ROLL_INTERVAL_MS {
            return Err(GachaError::RateLimited {
                retry_after_ms: MIN_ROLL_INTERVAL_MS - since.max(0),
            });
        }
    }
    if progress.coins < ROLL_COST {
        return Err(GachaError::InsufficientFunds);
    }
    progress.coins -= ROLL_COST;
    progress.last_roll_at = Some(now);
    Ok(())
}

/// Credit one coin per whole elapsed hour since `last_coin_at`.
///
/// At most [`MAX_ACCRUAL_HOURS`] are paid however long the absence was. The
/// anchor moves to `now` minus the sub-hour remainder, so unpaid hours past
/// the cap are forfeited. A clock that moved backwards resets the anchor to
/// `now` and pays nothing. Returns the coins actually added.
pub fn accrue_passive_coins(progress: &mut UserProgress, now: DateTime<Utc>) -> u32 {
    let elapsed = now.signed_duration_since(progress.last_coin_at);
    if elapsed < Duration::zero() {
        log::warn!(
            "economy: clock regression for {} ({}ms), resetting accrual anchor",
            progress.user_id,
            elapsed.num_milliseconds()
        );
        progress.last_coin_at = now;
        return 0;
    }
    let whole_hours = elapsed.num_hours();
    if whole_hours < 1 {
        return 0;
    }
    progress.last_coin_at = now - (elapsed - Duration::hours(whole_hours));
    grant_coins(progress, whole_hours.min(MAX_ACCRUAL_HOURS) as u32)
}

/// Pay the daily login bonus once per calendar day. Returns the coins added.
///
/// `today` is chosen by the caller; [`Session::login`](crate::gacha::Session::login)
/// passes the UTC date so the day boundary does not depend on the host time zone.
pub fn claim_daily_bonus(progress: &mut UserProgress, today: NaiveDate) -> Option<u32> {
    if progress.last_login_date == Some(today) {
        return None;
    }
    progress.last_login_date = Some(today);
    Some(grant_coins(progress, DAILY_BONUS_COINS))
}

/// Repair impossible values found in persisted progress.
///
/// Each repair is reported as a [`GachaError::CorruptedState`] diagnostic; none is fatal.
pub fn heal_corruption(progress: &mut UserProgress, now: DateTime<Utc>) -> Vec<GachaError> {
    let mut repairs = Vec::new();
    if progress.coins < 0 {
        repairs.push(format!("negative balance {} reset to 0", progress.coins));
        progress.coins = 0;
    } else if progress.coins > COIN_CAP {
        repairs.push(format!(
            "balance {} clamped to {}",
            progress.coins, COIN_CAP
        ));
        progress.coins = COIN_CAP;
    }
    if progress.last_coin_at > now {
        repairs.push("future accrual anchor reset to now".to_string());
        progress.last_coin_at = now;
    }
    if progress.last_roll_at.is_some_and(|t| t > now) {
        repairs.push("future roll timestamp reset to now".to_string());
        progress.last_roll_at = Some(now);
    }
    if progress.level == 0 {
        repairs.push("level 0 raised to 1".to_string());
        progress.level = 1;
    }
    if progress.xp_to_next == 0 {
        repairs.push(format!("xp threshold 0 reset to {}", DEFAULT_XP_TO_NEXT));
        progress.xp_to_next = DEFAULT_XP_TO_NEXT;
    }
    if progress.recent_catches.len() > RECENT_CATCHES_LIMIT {
        repairs.push(format!(
            "recent catches truncated from {}",
            progress.recent_catches.len()
        ));
        progress.recent_catches.truncate(RECENT_CATCHES_LIMIT);
    }

    repairs
        .into_iter()
        .map(|msg| {
            log::warn!("economy: {}: {}", progress.user_id, msg);
            GachaError::CorruptedState(msg)
        })
        .collect()
}
