//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pokeroller::gacha::{
    AchievementBook, Catalog, CatalogEntry, GachaStore, GachaStoreBuilder, GameRules, Rarity,
    UserProgress,
};

/// The sample catalog shipped with `pokeroller init`.
#[allow(dead_code)]
pub fn sample_catalog_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("catalog.sample.json")
}

/// Sample catalog plus synthesized shinies and the starter achievements.
#[allow(dead_code)]
pub fn sample_rules() -> Arc<GameRules> {
    let catalog = Catalog::load_json(sample_catalog_path())
        .expect("sample catalog")
        .with_shiny_variants()
        .expect("shinies");
    Arc::new(GameRules::new(catalog, AchievementBook::starter()))
}

/// A full-size dex: `size` base entries (ids 1..=size) with one shiny each.
#[allow(dead_code)]
pub fn dex_catalog(size: u32) -> Catalog {
    let entries = (1..=size)
        .map(|id| {
            let rarity = match id % 20 {
                0 => Rarity::Legendary,
                1..=3 => Rarity::Rare,
                4..=9 => Rarity::Uncommon,
                _ => Rarity::Common,
            };
            CatalogEntry::new(id, &format!("Mon{}", id), "normal", 1, rarity)
        })
        .collect();
    Catalog::new(entries)
        .expect("dex catalog")
        .with_shiny_variants()
        .expect("shinies")
}

/// Fresh sled store in a temp dir. Keep the `TempDir` alive for the test.
#[allow(dead_code)]
pub fn temp_store() -> (tempfile::TempDir, Arc<GachaStore>) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = GachaStoreBuilder::new(tmp.path().join("db"))
        .open()
        .expect("store");
    (tmp, Arc::new(store))
}

/// Fixed reference instant so accrual math is reproducible.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap()
}

/// `t0` plus `secs` seconds; one roll per second stays clear of the rate limit.
#[allow(dead_code)]
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Store a user with a tweaked starting state.
#[allow(dead_code)]
pub fn seed_user<F: FnOnce(&mut UserProgress)>(store: &GachaStore, user_id: &str, tweak: F) {
    let mut progress = UserProgress::new(user_id, t0());
    tweak(&mut progress);
    store.put_user(&progress).expect("seed user");
}
