//! Per-user game sessions.
//!
//! A [`Session`] owns one user's [`UserProgress`] and runs every mutation
//! (login, roll, claim, equip) against shared [`GameRules`] and a
//! [`ProgressStore`]. The [`SessionPool`] hands out one session per user
//! behind its own mutex so a user's rolls never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gacha::achievement::{
    claim_achievement, evaluate_achievements, progress_view, AchievementBook,
    AchievementProgressView, ClaimReceipt,
};
use crate::gacha::catalog::Catalog;
use crate::gacha::collection::{collection_stats, record_acquisitions, CollectionStats};
use crate::gacha::economy::{
    accrue_passive_coins, charge_for_roll, claim_daily_bonus, heal_corruption,
};
use crate::gacha::errors::GachaError;
use crate::gacha::pack::{generate_pack, RandomSource};
use crate::gacha::progression::{advance_experience, LeveledUp};
use crate::gacha::storage::ProgressStore;
use crate::gacha::title::equip_title;
use crate::gacha::types::{AchievementDefinition, CatalogEntry, UserProgress};
use crate::logutil::escape_log;
use crate::validation::validate_user_id;

/// Read-only rules shared by every session.
#[derive(Debug)]
pub struct GameRules {
    pub catalog: Catalog,
    pub achievements: AchievementBook,
}

impl GameRules {
    pub fn new(catalog: Catalog, achievements: AchievementBook) -> Self {
        Self {
            catalog,
            achievements,
        }
    }
}

/// Everything one roll produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub cards: Vec<CatalogEntry>,
    pub new_catches: usize,
    pub leveled_up: Option<LeveledUp>,
    pub newly_completed: Vec<AchievementDefinition>,
    pub coins_after: i32,
    /// Set when the durable write failed; in-memory state is still authoritative.
    pub persistence_warning: Option<String>,
}

/// What happened when the user signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSummary {
    pub repairs: Vec<String>,
    pub passive_coins: u32,
    pub daily_bonus: Option<u32>,
    pub coins_after: i32,
    pub persistence_warning: Option<String>,
}

pub struct Session<S: ProgressStore> {
    progress: UserProgress,
    rules: Arc<GameRules>,
    store: Arc<S>,
    dirty: bool,
    last_warning: Option<String>,
}

impl<S: ProgressStore> Session<S> {
    /// Load the user's progress, registering a fresh account if none exists.
    pub fn open(
        user_id: &str,
        rules: Arc<GameRules>,
        store: Arc<S>,
        now: DateTime<Utc>,
    ) -> Result<Self, GachaError> {
        let user_id = validate_user_id(user_id)?;
        let (progress, dirty) = match store.load(&user_id)? {
            Some(progress) => (progress, false),
            None => {
                log::info!("session: registering new user {}", escape_log(&user_id));
                (UserProgress::new(&user_id, now), true)
            }
        };
        let mut session = Self {
            progress,
            rules,
            store,
            dirty,
            last_warning: None,
        };
        if session.dirty {
            session.persist();
        }
        Ok(session)
    }

    pub fn user_id(&self) -> &str {
        &self.progress.user_id
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// True while an unsaved change is held only in memory.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_persistence_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    /// Repair stored state, pay passive accrual and the daily bonus.
    ///
    /// The daily bonus is keyed on the UTC calendar date of `now`.
    pub fn login(&mut self, now: DateTime<Utc>) -> LoginSummary {
        let repairs = self.heal(now);
        let passive_coins = accrue_passive_coins(&mut self.progress, now);
        let daily_bonus = claim_daily_bonus(&mut self.progress, now.date_naive());
        self.progress.touch(now);
        if let Some(bonus) = daily_bonus {
            log::info!(
                "session: {} daily bonus +{}",
                escape_log(&self.progress.user_id),
                bonus
            );
        }
        let persistence_warning = self.persist();
        LoginSummary {
            repairs,
            passive_coins,
            daily_bonus,
            coins_after: self.progress.coins,
            persistence_warning,
        }
    }

    /// Charge one coin, open a pack and run it through the collection,
    /// progression and achievement steps.
    ///
    /// Any failure restores progress as it was before the call, including
    /// the repairs and accrual applied ahead of the charge.
    pub fn roll<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<RollResult, GachaError> {
        let snapshot = self.progress.clone();
        self.heal(now);
        accrue_passive_coins(&mut self.progress, now);

        if let Err(e) = charge_for_roll(&mut self.progress, now) {
            self.progress = snapshot;
            return Err(e);
        }
        let cards = match generate_pack(&self.rules.catalog, rng) {
            Ok(cards) => cards,
            Err(e) => {
                log::error!(
                    "session: pack generation failed for {}: {}",
                    escape_log(&snapshot.user_id),
                    e
                );
                self.progress = snapshot;
                return Err(e);
            }
        };

        let new_catches = record_acquisitions(&mut self.progress, &cards, now);
        let leveled_up = advance_experience(&mut self.progress);
        let newly_completed = evaluate_achievements(
            &mut self.progress,
            &self.rules.catalog,
            &self.rules.achievements,
        )
        .into_iter()
        .cloned()
        .collect();
        self.progress.touch(now);
        log::debug!(
            "session: {} opened pack #{} ({} new)",
            escape_log(&self.progress.user_id),
            self.progress.packs_opened,
            new_catches
        );

        let persistence_warning = self.persist();
        Ok(RollResult {
            cards,
            new_catches,
            leveled_up,
            newly_completed,
            coins_after: self.progress.coins,
            persistence_warning,
        })
    }

    pub fn claim(
        &mut self,
        achievement_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, GachaError> {
        let mut receipt =
            claim_achievement(&mut self.progress, &self.rules.achievements, achievement_id)?;
        self.progress.touch(now);
        receipt.persistence_warning = self.persist();
        Ok(receipt)
    }

    /// Equip an owned title. Returns the degraded-mode warning if the save failed.
    pub fn equip(&mut self, title: &str, now: DateTime<Utc>) -> Result<Option<String>, GachaError> {
        equip_title(&mut self.progress, &self.rules.achievements, title)?;
        self.progress.touch(now);
        Ok(self.persist())
    }

    pub fn achievements(&self) -> Vec<AchievementProgressView> {
        progress_view(&self.progress, &self.rules.catalog, &self.rules.achievements)
    }

    pub fn stats(&self) -> CollectionStats {
        collection_stats(&self.progress, &self.rules.catalog)
    }

    /// Retry any pending write. Errors with `PersistenceFailure` if it still fails.
    pub fn flush(&mut self) -> Result<(), GachaError> {
        if !self.dirty {
            return Ok(());
        }
        match self.persist() {
            None => Ok(()),
            Some(warning) => Err(GachaError::PersistenceFailure(warning)),
        }
    }

    fn heal(&mut self, now: DateTime<Utc>) -> Vec<String> {
        heal_corruption(&mut self.progress, now)
            .into_iter()
            .map(|diag| diag.to_string())
            .collect()
    }

    /// Best-effort save. Returns a degraded-mode warning on failure.
    fn persist(&mut self) -> Option<String> {
        match self.store.save(&self.progress.user_id, &self.progress) {
            Ok(()) => {
                self.dirty = false;
                self.last_warning = None;
                None
            }
            Err(e) => {
                log::warn!(
                    "session: save failed for {}, keeping in-memory state: {}",
                    escape_log(&self.progress.user_id),
                    e
                );
                let warning = format!("progress not saved: {}", e);
                self.dirty = true;
                self.last_warning = Some(warning.clone());
                Some(warning)
            }
        }
    }
}

/// One session per user, each behind its own mutex.
pub struct SessionPool<S: ProgressStore> {
    rules: Arc<GameRules>,
    store: Arc<S>,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session<S>>>>>>,
}

impl<S: ProgressStore> SessionPool<S> {
    pub fn new(rules: Arc<GameRules>, store: Arc<S>) -> Self {
        Self {
            rules,
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn rules(&self) -> &Arc<GameRules> {
        &self.rules
    }

    /// Fetch the user's session, opening it on first use.
    pub fn session(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<Mutex<Session<S>>>, GachaError> {
        let key = user_id.trim().to_ascii_lowercase();
        {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = sessions.get(&key) {
                return Ok(Arc::clone(existing));
            }
        }
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = sessions.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let session = Session::open(
            user_id,
            Arc::clone(&self.rules),
            Arc::clone(&self.store),
            now,
        )?;
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush a user's session and drop it from the pool.
    ///
    /// A failed flush leaves the session pooled with its unsaved progress.
    pub fn evict(&self, user_id: &str) -> Result<(), GachaError> {
        let key = user_id.trim().to_ascii_lowercase();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = sessions.get(&key).cloned() {
            handle.lock().unwrap_or_else(|e| e.into_inner()).flush()?;
            sessions.remove(&key);
        }
        Ok(())
    }

    /// Flush every dirty session. Returns the first failure after trying all.
    pub fn flush_all(&self) -> Result<(), GachaError> {
        let handles: Vec<_> = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        let mut first_err = None;
        for handle in handles {
            let mut session = handle.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = session.flush() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
