//! Ownership bookkeeping: per-entry counts, the recent catches log, and
//! read-side collection statistics.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gacha::catalog::Catalog;
use crate::gacha::types::{CatalogEntry, CatchEvent, Rarity, UserProgress, RECENT_CATCHES_LIMIT};

/// Record a rolled pack. Returns how many cards were first-time catches.
pub fn record_acquisitions(
    progress: &mut UserProgress,
    cards: &[CatalogEntry],
    now: DateTime<Utc>,
) -> usize {
    let mut new_catches = 0;
    for card in cards {
        let count = progress.card_counts.entry(card.id).or_insert(0);
        let was_new = *count == 0;
        *count = count.saturating_add(1);
        let count = *count;
        progress.cards_collected = progress.cards_collected.saturating_add(1);
        if was_new {
            new_catches += 1;
        }

        progress.recent_catches.push_front(CatchEvent {
            entry_id: card.id,
            name: card.name.clone(),
            type_tag: card.type_tag.clone(),
            count,
            caught_at: now,
            was_new,
        });
        progress.recent_catches.truncate(RECENT_CATCHES_LIMIT);
    }
    progress.packs_opened = progress.packs_opened.saturating_add(1);
    new_catches
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityTally {
    /// Distinct entries owned
    pub unique: usize,
    /// Copies across those entries
    pub copies: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub unique_owned: usize,
    pub total_cards: u64,
    pub packs_opened: u64,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub coins: i32,
    pub by_rarity: BTreeMap<Rarity, RarityTally>,
    /// Owned non-shiny entries against the non-shiny catalog size
    pub dex_owned: usize,
    pub dex_size: usize,
    pub catalog_size: usize,
}

impl CollectionStats {
    pub fn dex_percent(&self) -> f64 {
        if self.dex_size == 0 {
            return 0.0;
        }
        self.dex_owned as f64 * 100.0 / self.dex_size as f64
    }
}

/// Summarize what a user owns. Ids missing from the catalog count toward totals only.
pub fn collection_stats(progress: &UserProgress, catalog: &Catalog) -> CollectionStats {
    let mut by_rarity: BTreeMap<Rarity, RarityTally> =
        Rarity::ALL.iter().map(|r| (*r, RarityTally::default())).collect();
    let mut unique_owned = 0;
    let mut total_cards = 0u64;
    for (id, count) in progress.card_counts.iter().filter(|(_, c)| **c > 0) {
        unique_owned += 1;
        total_cards += u64::from(*count);
        if let Some(rarity) = catalog.rarity_of(*id) {
            let tally = by_rarity.entry(rarity).or_default();
            tally.unique += 1;
            tally.copies += u64::from(*count);
        }
    }
    let dex_owned = by_rarity
        .iter()
        .filter(|(r, _)| **r != Rarity::Shiny)
        .map(|(_, t)| t.unique)
        .sum();

    CollectionStats {
        unique_owned,
        total_cards,
        packs_opened: progress.packs_opened,
        level: progress.level,
        xp: progress.xp,
        xp_to_next: progress.xp_to_next,
        coins: progress.coins,
        by_rarity,
        dex_owned,
        dex_size: catalog.base_len(),
        catalog_size: catalog.len(),
    }
}
