//! Weighted pack generation.
//!
//! Each of the [`PACK_SIZE`] slots is an independent trial:
//! - [`SHINY_CHANCE`] to pull a uniformly random shiny (falls through when the catalog has none)
//! - otherwise a ticket is drawn from a fixed pool: common ×5, uncommon ×3, rare ×2
//! - with [`LEGENDARY_CHANCE`] a single legendary ticket is appended to that pool first,
//!   so a legendary is only possible on slots where the coin-flip lands (1 in 11 then)
//! - the card is a uniform pick among catalog entries of the drawn tier
//!
//! A slot whose tier has no entries yields nothing and the whole pack is rolled again,
//! up to [`MAX_PACK_ATTEMPTS`] times.

use rand::Rng;

use crate::gacha::catalog::Catalog;
use crate::gacha::errors::GachaError;
use crate::gacha::types::{CatalogEntry, Rarity};

pub const PACK_SIZE: usize = 5;
pub const SHINY_CHANCE: f64 = 0.01;
pub const LEGENDARY_CHANCE: f64 = 0.1;
pub const MAX_PACK_ATTEMPTS: u32 = 16;

/// Fixed ticket pool every slot draws from (before the optional legendary ticket).
const BASE_TICKETS: [Rarity; 10] = [
    Rarity::Common,
    Rarity::Common,
    Rarity::Common,
    Rarity::Common,
    Rarity::Common,
    Rarity::Uncommon,
    Rarity::Uncommon,
    Rarity::Uncommon,
    Rarity::Rare,
    Rarity::Rare,
];

/// Randomness consumed by the generator.
pub trait RandomSource {
    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Roll one full pack. See the module docs for the slot algorithm.
pub fn generate_pack<R: RandomSource + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> Result<Vec<CatalogEntry>, GachaError> {
    for attempt in 1..=MAX_PACK_ATTEMPTS {
        let cards: Vec<CatalogEntry> = (0..PACK_SIZE)
            .filter_map(|_| roll_slot(catalog, rng))
            .cloned()
            .collect();
        if cards.len() == PACK_SIZE {
            return Ok(cards);
        }
        log::warn!(
            "pack: attempt {} produced {} of {} cards, regenerating",
            attempt,
            cards.len(),
            PACK_SIZE
        );
    }
    Err(GachaError::CatalogMisconfigured {
        attempts: MAX_PACK_ATTEMPTS,
    })
}

fn roll_slot<'c, R: RandomSource + ?Sized>(
    catalog: &'c Catalog,
    rng: &mut R,
) -> Option<&'c CatalogEntry> {
    if rng.next_unit() < SHINY_CHANCE {
        if let Some(shiny) = pick_from_tier(catalog, Rarity::Shiny, rng) {
            return Some(shiny);
        }
    }
    let tier = draw_tier(rng);
    pick_from_tier(catalog, tier, rng)
}

/// Draw a tier from the ticket pool, flipping the legendary coin first.
pub(crate) fn draw_tier<R: RandomSource + ?Sized>(rng: &mut R) -> Rarity {
    let with_legendary = rng.next_unit() < LEGENDARY_CHANCE;
    let pool_len = BASE_TICKETS.len() + usize::from(with_legendary);
    let ticket = rng.pick(pool_len);
    BASE_TICKETS.get(ticket).copied().unwrap_or(Rarity::Legendary)
}

fn pick_from_tier<'c, R: RandomSource + ?Sized>(
    catalog: &'c Catalog,
    tier: Rarity,
    rng: &mut R,
) -> Option<&'c CatalogEntry> {
    let len = catalog.count_of(tier);
    if len == 0 {
        return None;
    }
    catalog.nth_of_rarity(tier, rng.pick(len))
}
