use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const USER_SCHEMA_VERSION: u8 = 1;

/// Hard ceiling on a user's coin balance. Every grant saturates here.
pub const COIN_CAP: i32 = 24;
/// Balance handed to a freshly registered account.
pub const STARTING_COINS: i32 = 3;
/// Experience needed per level. Flat, no scaling curve.
pub const DEFAULT_XP_TO_NEXT: u32 = 25;
/// Length of the most-recent-first catch log.
pub const RECENT_CATCHES_LIMIT: usize = 20;

// ============================================================================
// Catalog Types
// ============================================================================

/// Canonical catalog identifier. Every lookup goes through this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
    Shiny,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
        Rarity::Shiny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
            Rarity::Shiny => "shiny",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Rarity::Common => 0,
            Rarity::Uncommon => 1,
            Rarity::Rare => 2,
            Rarity::Legendary => 3,
            Rarity::Shiny => 4,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collectible definition. Shiny variants point back at their base entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub generation: u8,
    pub rarity: Rarity,
    #[serde(default, alias = "originalId", skip_serializing_if = "Option::is_none")]
    pub base_entry_id: Option<EntryId>,
}

impl CatalogEntry {
    pub fn new(id: u32, name: &str, type_tag: &str, generation: u8, rarity: Rarity) -> Self {
        Self {
            id: EntryId(id),
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            generation,
            rarity,
            base_entry_id: None,
        }
    }

    /// Build the shiny counterpart of `base` under a new id.
    pub fn shiny_of(id: u32, base: &CatalogEntry) -> Self {
        Self {
            id: EntryId(id),
            name: format!("Shiny {}", base.name),
            type_tag: base.type_tag.clone(),
            generation: base.generation,
            rarity: Rarity::Shiny,
            base_entry_id: Some(base.id),
        }
    }

    pub fn is_shiny(&self) -> bool {
        self.rarity == Rarity::Shiny
    }
}

// ============================================================================
// Achievement Definitions
// ============================================================================

/// Quantity an achievement measures. Always recomputed from current progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    RollsOpened,
    UniqueOwned,
    ShinyOwned,
    LegendaryOwned,
    DexExcludingShiny,
    DexIncludingShiny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub reward_coins: u32,
    pub requirement: u64,
    pub metric: AchievementMetric,
    /// Cosmetic title unlocked by claiming this achievement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AchievementDefinition {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        metric: AchievementMetric,
        requirement: u64,
        reward_coins: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            reward_coins,
            requirement,
            metric,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

// ============================================================================
// Per-user Progress
// ============================================================================

/// One card landing in the collection, as shown in the recent catches strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchEvent {
    pub entry_id: EntryId,
    pub name: String,
    pub type_tag: String,
    /// Copies owned right after this catch
    pub count: u32,
    pub caught_at: DateTime<Utc>,
    /// True iff the user owned zero copies before this catch
    pub was_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Signed on purpose: a negative balance on disk must be detectable.
    pub coins: i32,
    #[serde(default)]
    pub last_roll_at: Option<DateTime<Utc>>,
    pub last_coin_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_date: Option<NaiveDate>,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    #[serde(default)]
    pub card_counts: BTreeMap<EntryId, u32>,
    #[serde(default)]
    pub packs_opened: u64,
    #[serde(default)]
    pub cards_collected: u64,
    #[serde(default)]
    pub recent_catches: VecDeque<CatchEvent>,
    #[serde(default)]
    pub completed_achievements: BTreeSet<String>,
    #[serde(default)]
    pub claimed_achievements: BTreeSet<String>,
    #[serde(default)]
    pub equipped_title: Option<String>,
    pub schema_version: u8,
}

impl UserProgress {
    /// Registration defaults.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            coins: STARTING_COINS,
            last_roll_at: None,
            last_coin_at: now,
            last_login_date: None,
            level: 1,
            xp: 0,
            xp_to_next: DEFAULT_XP_TO_NEXT,
            card_counts: BTreeMap::new(),
            packs_opened: 0,
            cards_collected: 0,
            recent_catches: VecDeque::new(),
            completed_achievements: BTreeSet::new(),
            claimed_achievements: BTreeSet::new(),
            equipped_title: None,
            schema_version: USER_SCHEMA_VERSION,
        }
    }

    pub fn count_of(&self, id: EntryId) -> u32 {
        self.card_counts.get(&id).copied().unwrap_or(0)
    }

    /// Ids with at least one copy.
    pub fn owned_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.card_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| *id)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Add `amount` coins, saturating at [`COIN_CAP`]. Returns the coins actually added.
pub(crate) fn grant_coins(progress: &mut UserProgress, amount: u32) -> u32 {
    let before = progress.coins;
    let room = (COIN_CAP - before).max(0) as u32;
    let added = amount.min(room);
    progress.coins = before + added as i32;
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_saturates_at_cap() {
        let mut p = UserProgress::new("ash", Utc::now());
        p.coins = 23;
        assert_eq!(grant_coins(&mut p, 5), 1);
        assert_eq!(p.coins, COIN_CAP);
        assert_eq!(grant_coins(&mut p, 5), 0);
        assert_eq!(p.coins, COIN_CAP);
    }

    #[test]
    fn catalog_entry_accepts_original_id_alias() {
        let json = r#"{"id": 11000, "name": "Shiny Bulbasaur", "type": "grass",
                       "generation": 1, "rarity": "shiny", "originalId": 1}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.base_entry_id, Some(EntryId(1)));
        assert!(entry.is_shiny());
    }

    #[test]
    fn owned_ids_skips_zero_counts() {
        let mut p = UserProgress::new("misty", Utc::now());
        p.card_counts.insert(EntryId(1), 2);
        p.card_counts.insert(EntryId(2), 0);
        let owned: Vec<_> = p.owned_ids().collect();
        assert_eq!(owned, vec![EntryId(1)]);
    }
}
