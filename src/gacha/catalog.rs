//! Static collectible catalog.
//!
//! Loaded once at startup, validated, then read-only. Lookups go through a
//! single id → index map and per-rarity index lists built at construction.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::gacha::errors::GachaError;
use crate::gacha::types::{CatalogEntry, EntryId, Rarity};

/// First id handed to synthesized shiny variants, well clear of the base dex.
pub const SHINY_ID_BASE: u32 = 11_000;

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<EntryId, usize>,
    by_rarity: [Vec<usize>; 5],
}

impl Catalog {
    /// Validate `entries` and build the lookup tables.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, GachaError> {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if entry.id.0 == 0 {
                return Err(GachaError::InvalidCatalog(format!(
                    "entry '{}' has id 0",
                    entry.name
                )));
            }
            if !(1..=9).contains(&entry.generation) {
                return Err(GachaError::InvalidCatalog(format!(
                    "entry {} has generation {} outside 1..=9",
                    entry.id, entry.generation
                )));
            }
            if by_id.insert(entry.id, idx).is_some() {
                return Err(GachaError::InvalidCatalog(format!(
                    "duplicate id {}",
                    entry.id
                )));
            }
        }

        let mut shiny_bases = HashSet::new();
        let mut by_rarity: [Vec<usize>; 5] = Default::default();
        for (idx, entry) in entries.iter().enumerate() {
            match (entry.rarity, entry.base_entry_id) {
                (Rarity::Shiny, Some(base_id)) => {
                    let base = by_id.get(&base_id).map(|&i| &entries[i]).ok_or_else(|| {
                        GachaError::InvalidCatalog(format!(
                            "shiny {} references missing base {}",
                            entry.id, base_id
                        ))
                    })?;
                    if base.is_shiny() {
                        return Err(GachaError::InvalidCatalog(format!(
                            "shiny {} references another shiny {}",
                            entry.id, base_id
                        )));
                    }
                    if !shiny_bases.insert(base_id) {
                        return Err(GachaError::InvalidCatalog(format!(
                            "base {} has more than one shiny variant",
                            base_id
                        )));
                    }
                }
                (Rarity::Shiny, None) => {
                    return Err(GachaError::InvalidCatalog(format!(
                        "shiny {} has no base entry",
                        entry.id
                    )));
                }
                (_, Some(_)) => {
                    return Err(GachaError::InvalidCatalog(format!(
                        "non-shiny {} carries a base entry reference",
                        entry.id
                    )));
                }
                (_, None) => {}
            }
            by_rarity[entry.rarity.index()].push(idx);
        }

        Ok(Self {
            entries,
            by_id,
            by_rarity,
        })
    }

    /// Load a JSON array of entries from `path`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, GachaError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&contents)?;
        let catalog = Self::new(entries)?;
        log::info!(
            "catalog: loaded {} entries ({} shiny) from {}",
            catalog.len(),
            catalog.count_of(Rarity::Shiny),
            path.display()
        );
        Ok(catalog)
    }

    /// Return a catalog where every base entry lacking a shiny gets one.
    /// New shinies take ids from [`SHINY_ID_BASE`] upward, skipping ids in use.
    pub fn with_shiny_variants(self) -> Result<Self, GachaError> {
        let covered: HashSet<EntryId> = self
            .entries
            .iter()
            .filter_map(|e| e.base_entry_id)
            .collect();
        let mut next_id = SHINY_ID_BASE;
        let mut entries = self.entries.clone();
        let mut added = 0usize;
        for base in self.entries.iter().filter(|e| !e.is_shiny()) {
            if covered.contains(&base.id) {
                continue;
            }
            while self.by_id.contains_key(&EntryId(next_id)) {
                next_id += 1;
            }
            entries.push(CatalogEntry::shiny_of(next_id, base));
            next_id += 1;
            added += 1;
        }
        if added > 0 {
            log::debug!("catalog: synthesized {} shiny variants", added);
        }
        Self::new(entries)
    }

    pub fn get(&self, id: EntryId) -> Option<&CatalogEntry> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn rarity_of(&self, id: EntryId) -> Option<Rarity> {
        self.get(id).map(|e| e.rarity)
    }

    /// Entries of one tier, in catalog order.
    pub fn of_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.by_rarity[rarity.index()]
            .iter()
            .map(move |&idx| &self.entries[idx])
    }

    pub fn count_of(&self, rarity: Rarity) -> usize {
        self.by_rarity[rarity.index()].len()
    }

    /// The `n`th entry of a tier; used by uniform draws.
    pub(crate) fn nth_of_rarity(&self, rarity: Rarity, n: usize) -> Option<&CatalogEntry> {
        self.by_rarity[rarity.index()]
            .get(n)
            .map(|&idx| &self.entries[idx])
    }

    /// The shiny variant of `base`, if the catalog has one.
    pub fn shiny_variant_of(&self, base: EntryId) -> Option<&CatalogEntry> {
        self.of_rarity(Rarity::Shiny)
            .find(|e| e.base_entry_id == Some(base))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-shiny entries (the "dex" universe).
    pub fn base_len(&self) -> usize {
        self.len() - self.count_of(Rarity::Shiny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new(1, "Bulbasaur", "grass", 1, Rarity::Common),
            CatalogEntry::new(4, "Charmander", "fire", 1, Rarity::Uncommon),
            CatalogEntry::new(6, "Charizard", "fire", 1, Rarity::Rare),
            CatalogEntry::new(150, "Mewtwo", "psychic", 1, Rarity::Legendary),
        ]
    }

    #[test]
    fn builds_lookup_tables() {
        let catalog = Catalog::new(sample()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.rarity_of(EntryId(150)), Some(Rarity::Legendary));
        assert_eq!(catalog.count_of(Rarity::Common), 1);
        assert_eq!(catalog.count_of(Rarity::Shiny), 0);
        assert!(catalog.get(EntryId(2)).is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut entries = sample();
        entries.push(CatalogEntry::new(1, "Ivysaur", "grass", 1, Rarity::Common));
        assert!(matches!(
            Catalog::new(entries),
            Err(GachaError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn rejects_dangling_and_double_shiny() {
        let mut entries = sample();
        let mut orphan = CatalogEntry::shiny_of(11000, &entries[0]);
        orphan.base_entry_id = Some(EntryId(999));
        entries.push(orphan);
        assert!(Catalog::new(entries).is_err());

        let mut entries = sample();
        entries.push(CatalogEntry::shiny_of(11000, &entries[0].clone()));
        entries.push(CatalogEntry::shiny_of(11001, &entries[0].clone()));
        assert!(Catalog::new(entries).is_err());
    }

    #[test]
    fn rejects_shiny_without_base() {
        let mut entries = sample();
        entries.push(CatalogEntry::new(11000, "Shiny ???", "normal", 1, Rarity::Shiny));
        assert!(Catalog::new(entries).is_err());
    }

    #[test]
    fn synthesizes_missing_shinies() {
        let mut entries = sample();
        entries.push(CatalogEntry::shiny_of(11000, &entries[0].clone()));
        let catalog = Catalog::new(entries).unwrap().with_shiny_variants().unwrap();
        assert_eq!(catalog.count_of(Rarity::Shiny), 4);
        assert_eq!(catalog.base_len(), 4);
        let charizard = catalog.shiny_variant_of(EntryId(6)).unwrap();
        assert_eq!(charizard.name, "Shiny Charizard");
        assert_ne!(charizard.id, EntryId(11000));
        assert_eq!(
            catalog.shiny_variant_of(EntryId(1)).unwrap().id,
            EntryId(11000)
        );
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": 25, "name": "Pikachu", "type": "electric", "generation": 1, "rarity": "uncommon"}]"#,
        )
        .unwrap();
        let catalog = Catalog::load_json(&path).unwrap();
        assert_eq!(catalog.get(EntryId(25)).unwrap().name, "Pikachu");
    }
}
