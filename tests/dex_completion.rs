//! Completion achievements over a full-size catalog.
mod common;

use chrono::Utc;

use common::dex_catalog;
use pokeroller::gacha::{
    claim_achievement, equip_title, evaluate_achievements, metric_value, owned_titles,
    progress_view, AchievementBook, AchievementMetric, EntryId, GachaError, UserProgress, COIN_CAP,
};

const DEX_SIZE: u32 = 1025;

#[test]
fn full_base_dex_completes_dex_but_not_all() {
    let catalog = dex_catalog(DEX_SIZE);
    assert_eq!(catalog.base_len(), 1025);
    assert_eq!(catalog.len(), 2050);
    let book = AchievementBook::starter();

    let mut progress = UserProgress::new("oak", Utc::now());
    for id in 1..=DEX_SIZE {
        progress.card_counts.insert(EntryId(id), 1);
    }

    assert_eq!(
        metric_value(&progress, &catalog, AchievementMetric::DexExcludingShiny),
        1025
    );
    assert_eq!(
        metric_value(&progress, &catalog, AchievementMetric::ShinyOwned),
        0
    );

    let newly: Vec<String> = evaluate_achievements(&mut progress, &catalog, &book)
        .into_iter()
        .map(|d| d.id.clone())
        .collect();
    assert!(newly.contains(&"complete_dex".to_string()));
    assert!(newly.contains(&"catch_1000".to_string()));
    assert!(!newly.contains(&"complete_all".to_string()));
    assert!(progress.completed_achievements.contains("complete_dex"));
    assert!(!progress.completed_achievements.contains("complete_all"));
}

#[test]
fn owning_every_shiny_completes_all() {
    let catalog = dex_catalog(DEX_SIZE);
    let book = AchievementBook::starter();
    let mut progress = UserProgress::new("oak", Utc::now());
    for entry in catalog.entries() {
        progress.card_counts.insert(entry.id, 1);
    }

    let newly: Vec<String> = evaluate_achievements(&mut progress, &catalog, &book)
        .into_iter()
        .map(|d| d.id.clone())
        .collect();
    assert!(newly.contains(&"complete_dex".to_string()));
    assert!(newly.contains(&"complete_all".to_string()));
    assert!(newly.contains(&"shiny_50".to_string()));
    assert!(newly.contains(&"legendary_20".to_string()));

    // Already-completed achievements are not reported twice.
    assert!(evaluate_achievements(&mut progress, &catalog, &book).is_empty());
}

#[test]
fn dex_title_unlocks_only_after_claim() {
    let catalog = dex_catalog(DEX_SIZE);
    let book = AchievementBook::starter();
    let mut progress = UserProgress::new("oak", Utc::now());
    for id in 1..=DEX_SIZE {
        progress.card_counts.insert(EntryId(id), 1);
    }
    evaluate_achievements(&mut progress, &catalog, &book);

    let view = progress_view(&progress, &catalog, &book);
    let dex = view.iter().find(|v| v.id == "complete_dex").unwrap();
    assert!(dex.completed && dex.ready_to_claim && !dex.claimed);
    let all = view.iter().find(|v| v.id == "complete_all").unwrap();
    assert_eq!((all.current, all.required), (1025, 2050));
    assert!(!all.completed && !all.ready_to_claim);

    assert!(matches!(
        equip_title(&mut progress, &book, "Keeper of the Dex"),
        Err(GachaError::TitleNotOwned(_))
    ));

    progress.coins = 0;
    let receipt = claim_achievement(&mut progress, &book, "complete_dex").unwrap();
    assert_eq!(receipt.title_unlocked.as_deref(), Some("Keeper of the Dex"));
    // Reward of 50 saturates at the cap.
    assert_eq!(receipt.coins_granted, COIN_CAP as u32);
    assert_eq!(progress.coins, COIN_CAP);
    assert!(progress.equipped_title.is_none());

    assert_eq!(owned_titles(&progress, &book), vec!["Keeper of the Dex"]);
    equip_title(&mut progress, &book, "Keeper of the Dex").unwrap();
    assert_eq!(progress.equipped_title.as_deref(), Some("Keeper of the Dex"));
    assert!(matches!(
        claim_achievement(&mut progress, &book, "complete_all"),
        Err(GachaError::NotCompleted(_))
    ));
}
