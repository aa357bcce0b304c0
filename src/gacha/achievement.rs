//! Achievement evaluation and claiming.
//!
//! Every achievement moves one way only: locked → completed → claimed.
//! Completion is re-evaluated after each roll by recomputing metrics from the
//! ownership map; claiming is an explicit user action that pays the reward.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::gacha::catalog::Catalog;
use crate::gacha::errors::GachaError;
use crate::gacha::types::{
    grant_coins, AchievementDefinition, AchievementMetric, Rarity, UserProgress,
};

/// Immutable, ordered set of achievement definitions.
#[derive(Debug, Clone)]
pub struct AchievementBook {
    definitions: Vec<AchievementDefinition>,
    by_id: HashMap<String, usize>,
}

impl AchievementBook {
    pub fn new(definitions: Vec<AchievementDefinition>) -> Result<Self, GachaError> {
        let mut by_id = HashMap::with_capacity(definitions.len());
        for (idx, def) in definitions.iter().enumerate() {
            if by_id.insert(def.id.clone(), idx).is_some() {
                return Err(GachaError::InvalidCatalog(format!(
                    "duplicate achievement id '{}'",
                    def.id
                )));
            }
        }
        Ok(Self { definitions, by_id })
    }

    /// The stock achievement set.
    pub fn starter() -> Self {
        let definitions = starter_achievements();
        let by_id = definitions
            .iter()
            .enumerate()
            .map(|(idx, def)| (def.id.clone(), idx))
            .collect();
        Self { definitions, by_id }
    }

    /// Load definitions from a JSON array file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, GachaError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let definitions: Vec<AchievementDefinition> = serde_json::from_str(&contents)?;
        Self::new(definitions)
    }

    pub fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.by_id.get(id).map(|&idx| &self.definitions[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementDefinition> + '_ {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// The thirteen achievements of the base game.
pub fn starter_achievements() -> Vec<AchievementDefinition> {
    use AchievementMetric::*;
    vec![
        AchievementDefinition::new("roll_50", "Rolling Beginner", "Roll 50 times", "🎲", RollsOpened, 50, 2),
        AchievementDefinition::new("roll_100", "Rolling Enthusiast", "Roll 100 times", "🎯", RollsOpened, 100, 3),
        AchievementDefinition::new("roll_200", "Rolling Master", "Roll 200 times", "🏆", RollsOpened, 200, 5),
        AchievementDefinition::new("roll_500", "Rolling Legend", "Roll 500 times", "👑", RollsOpened, 500, 10),
        AchievementDefinition::new("catch_100", "Pokémon Collector", "Catch 100 unique Pokémon", "📚", UniqueOwned, 100, 3),
        AchievementDefinition::new("catch_500", "Pokémon Expert", "Catch 500 unique Pokémon", "📖", UniqueOwned, 500, 5),
        AchievementDefinition::new("catch_1000", "Pokémon Master", "Catch 1000 unique Pokémon", "📚", UniqueOwned, 1000, 10),
        AchievementDefinition::new("shiny_10", "Shiny Hunter", "Catch 10 shiny Pokémon", "✨", ShinyOwned, 10, 5),
        AchievementDefinition::new("shiny_50", "Shiny Expert", "Catch 50 shiny Pokémon", "💎", ShinyOwned, 50, 10),
        AchievementDefinition::new("legendary_5", "Legendary Hunter", "Catch 5 legendary Pokémon", "🌟", LegendaryOwned, 5, 5),
        AchievementDefinition::new("legendary_20", "Legendary Master", "Catch 20 legendary Pokémon", "⭐", LegendaryOwned, 20, 10),
        AchievementDefinition::new("complete_dex", "Keeper of the Dex", "Catch all 1025 Pokémon", "📖", DexExcludingShiny, 1025, 50)
            .with_title("Keeper of the Dex"),
        AchievementDefinition::new("complete_all", "The Shimmering One", "Catch all 2050 Pokémon (including shinies)", "✨", DexIncludingShiny, 2050, 100)
            .with_title("The Shimmering One"),
    ]
}

/// Current value of `metric` for `progress`, computed from scratch.
pub fn metric_value(progress: &UserProgress, catalog: &Catalog, metric: AchievementMetric) -> u64 {
    let owned_matching = |pred: &dyn Fn(Rarity) -> bool| {
        progress
            .owned_ids()
            .filter(|id| catalog.rarity_of(*id).is_some_and(pred))
            .count() as u64
    };
    match metric {
        AchievementMetric::RollsOpened => progress.packs_opened,
        AchievementMetric::UniqueOwned | AchievementMetric::DexIncludingShiny => {
            progress.owned_ids().count() as u64
        }
        AchievementMetric::ShinyOwned => owned_matching(&|r| r == Rarity::Shiny),
        AchievementMetric::LegendaryOwned => owned_matching(&|r| r == Rarity::Legendary),
        AchievementMetric::DexExcludingShiny => owned_matching(&|r| r != Rarity::Shiny),
    }
}

/// Mark every achievement whose threshold is met as completed.
/// Returns the ones that were not completed before this call.
pub fn evaluate_achievements<'b>(
    progress: &mut UserProgress,
    catalog: &Catalog,
    book: &'b AchievementBook,
) -> Vec<&'b AchievementDefinition> {
    let mut newly = Vec::new();
    for def in book.iter() {
        if progress.completed_achievements.contains(&def.id) {
            continue;
        }
        if metric_value(progress, catalog, def.metric) >= def.requirement {
            progress.completed_achievements.insert(def.id.clone());
            log::info!(
                "achievement: {} completed '{}'",
                progress.user_id,
                def.id
            );
            newly.push(def);
        }
    }
    newly
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub achievement_id: String,
    /// Coins actually added after saturation
    pub coins_granted: u32,
    pub title_unlocked: Option<String>,
    /// Set by the session when the durable write failed
    #[serde(default)]
    pub persistence_warning: Option<String>,
}

/// Claim a completed achievement's reward. Never auto-equips the title.
pub fn claim_achievement(
    progress: &mut UserProgress,
    book: &AchievementBook,
    achievement_id: &str,
) -> Result<ClaimReceipt, GachaError> {
    let def = book
        .get(achievement_id)
        .ok_or_else(|| GachaError::UnknownAchievement(achievement_id.to_string()))?;
    if progress.claimed_achievements.contains(&def.id) {
        return Err(GachaError::AlreadyClaimed(def.id.clone()));
    }
    if !progress.completed_achievements.contains(&def.id) {
        return Err(GachaError::NotCompleted(def.id.clone()));
    }
    progress.claimed_achievements.insert(def.id.clone());
    let coins_granted = grant_coins(progress, def.reward_coins);
    log::info!(
        "achievement: {} claimed '{}' (+{} coins)",
        progress.user_id,
        def.id,
        coins_granted
    );
    Ok(ClaimReceipt {
        achievement_id: def.id.clone(),
        coins_granted,
        title_unlocked: def.title.clone(),
        persistence_warning: None,
    })
}

/// Read-side projection of one achievement for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgressView {
    pub id: String,
    pub name: String,
    pub current: u64,
    pub required: u64,
    pub completed: bool,
    pub claimed: bool,
    pub ready_to_claim: bool,
}

pub fn progress_view(
    progress: &UserProgress,
    catalog: &Catalog,
    book: &AchievementBook,
) -> Vec<AchievementProgressView> {
    book.iter()
        .map(|def| {
            let current = metric_value(progress, catalog, def.metric);
            let recorded = progress.completed_achievements.contains(&def.id);
            let claimed = progress.claimed_achievements.contains(&def.id);
            AchievementProgressView {
                id: def.id.clone(),
                name: def.name.clone(),
                current,
                required: def.requirement,
                completed: recorded || current >= def.requirement,
                claimed,
                ready_to_claim: recorded && !claimed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gacha::types::{CatalogEntry, EntryId, COIN_CAP};
    use chrono::Utc;

    fn tiny_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new(1, "Bulbasaur", "grass", 1, Rarity::Common),
            CatalogEntry::new(144, "Articuno", "ice", 1, Rarity::Legendary),
        ])
        .unwrap()
        .with_shiny_variants()
        .unwrap()
    }

    #[test]
    fn starter_book_has_unique_ids_and_two_titles() {
        let book = AchievementBook::starter();
        assert_eq!(book.len(), 13);
        assert!(AchievementBook::new(starter_achievements()).is_ok());
        let titled: Vec<_> = book.iter().filter_map(|d| d.title.as_deref()).collect();
        assert_eq!(titled, vec!["Keeper of the Dex", "The Shimmering One"]);
    }

    #[test]
    fn metrics_follow_catalog_rarity() {
        let catalog = tiny_catalog();
        let shiny = catalog.shiny_variant_of(EntryId(144)).unwrap().id;
        let mut p = UserProgress::new("erika", Utc::now());
        p.packs_opened = 7;
        p.card_counts.insert(EntryId(144), 1);
        p.card_counts.insert(shiny, 3);
        p.card_counts.insert(EntryId(1), 0);

        assert_eq!(metric_value(&p, &catalog, AchievementMetric::RollsOpened), 7);
        assert_eq!(metric_value(&p, &catalog, AchievementMetric::UniqueOwned), 2);
        assert_eq!(metric_value(&p, &catalog, AchievementMetric::ShinyOwned), 1);
        assert_eq!(metric_value(&p, &catalog, AchievementMetric::LegendaryOwned), 1);
        assert_eq!(metric_value(&p, &catalog, AchievementMetric::DexExcludingShiny), 1);
        assert_eq!(metric_value(&p, &catalog, AchievementMetric::DexIncludingShiny), 2);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let catalog = tiny_catalog();
        let book = AchievementBook::starter();
        let mut p = UserProgress::new("erika", Utc::now());
        p.packs_opened = 50;
        let first: Vec<_> = evaluate_achievements(&mut p, &catalog, &book)
            .into_iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(first, vec!["roll_50".to_string()]);
        assert!(evaluate_achievements(&mut p, &catalog, &book).is_empty());
    }

    #[test]
    fn completion_never_regresses() {
        let catalog = tiny_catalog();
        let book = AchievementBook::starter();
        let mut p = UserProgress::new("erika", Utc::now());
        p.packs_opened = 100;
        evaluate_achievements(&mut p, &catalog, &book);
        p.packs_opened = 10;
        evaluate_achievements(&mut p, &catalog, &book);
        assert!(p.completed_achievements.contains("roll_100"));
        let view = progress_view(&p, &catalog, &book);
        let roll_100 = view.iter().find(|v| v.id == "roll_100").unwrap();
        assert!(roll_100.completed);
        assert!(roll_100.ready_to_claim);
        assert_eq!(roll_100.current, 10);
    }

    #[test]
    fn claim_checks_state_and_pays_once() {
        let book = AchievementBook::starter();
        let mut p = UserProgress::new("erika", Utc::now());
        p.coins = 0;

        assert!(matches!(
            claim_achievement(&mut p, &book, "roll_50"),
            Err(GachaError::NotCompleted(_))
        ));
        assert!(matches!(
            claim_achievement(&mut p, &book, "roll_9000"),
            Err(GachaError::UnknownAchievement(_))
        ));

        p.completed_achievements.insert("roll_50".into());
        let receipt = claim_achievement(&mut p, &book, "roll_50").unwrap();
        assert_eq!(receipt.coins_granted, 2);
        assert!(receipt.title_unlocked.is_none());
        assert!(matches!(
            claim_achievement(&mut p, &book, "roll_50"),
            Err(GachaError::AlreadyClaimed(_))
        ));
        assert_eq!(p.coins, 2);
    }

    #[test]
    fn claim_reward_saturates_and_unlocks_title() {
        let book = AchievementBook::starter();
        let mut p = UserProgress::new("erika", Utc::now());
        p.coins = 20;
        p.completed_achievements.insert("complete_dex".into());
        let receipt = claim_achievement(&mut p, &book, "complete_dex").unwrap();
        assert_eq!(receipt.coins_granted, 4);
        assert_eq!(p.coins, COIN_CAP);
        assert_eq!(receipt.title_unlocked.as_deref(), Some("Keeper of the Dex"));
        assert!(p.equipped_title.is_none());
    }

    #[test]
    fn book_rejects_duplicates_and_loads_json() {
        let dup = vec![starter_achievements()[0].clone(), starter_achievements()[0].clone()];
        assert!(AchievementBook::new(dup).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("achievements.json");
        std::fs::write(
            &path,
            r#"[{"id": "first", "name": "First", "description": "Roll once", "icon": "🎲",
                 "reward_coins": 1, "requirement": 1, "metric": "rolls_opened"}]"#,
        )
        .unwrap();
        let book = AchievementBook::load_json(&path).unwrap();
        assert_eq!(book.get("first").unwrap().metric, AchievementMetric::RollsOpened);
    }
}
