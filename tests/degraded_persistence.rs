//! Rolls keep working when the durable store is down.
mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{at, sample_rules, t0};
use pokeroller::gacha::{GachaError, ProgressStore, SessionPool, UserProgress};

#[derive(Default)]
struct FlakyStore {
    records: Mutex<HashMap<String, UserProgress>>,
    down: AtomicBool,
}

impl ProgressStore for FlakyStore {
    fn load(&self, user_id: &str) -> Result<Option<UserProgress>, GachaError> {
        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    fn save(&self, user_id: &str, progress: &UserProgress) -> Result<(), GachaError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(GachaError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store offline",
            )));
        }
        self.records
            .lock()
            .unwrap()
            .insert(user_id.to_string(), progress.clone());
        Ok(())
    }
}

#[test]
fn roll_succeeds_with_warning_while_store_is_down() {
    let store = Arc::new(FlakyStore::default());
    let pool = SessionPool::new(sample_rules(), Arc::clone(&store));
    let handle = pool.session("erika", t0()).unwrap();
    store.down.store(true, Ordering::SeqCst);

    let mut rng = StdRng::seed_from_u64(8);
    let result = handle.lock().unwrap().roll(&mut rng, at(1)).unwrap();
    let warning = result.persistence_warning.expect("degraded warning");
    assert!(warning.contains("store offline"));
    assert_eq!(result.coins_after, 2);

    {
        let session = handle.lock().unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.progress().packs_opened, 1);
    }
    // Durable copy still holds the registration state.
    assert_eq!(
        store.load("erika").unwrap().unwrap().packs_opened,
        0
    );
    assert!(matches!(
        pool.flush_all(),
        Err(GachaError::PersistenceFailure(_))
    ));

    store.down.store(false, Ordering::SeqCst);
    pool.flush_all().unwrap();
    assert!(!handle.lock().unwrap().is_dirty());
    assert_eq!(store.load("erika").unwrap().unwrap().packs_opened, 1);
}

#[test]
fn next_successful_mutation_clears_degraded_state() {
    let store = Arc::new(FlakyStore::default());
    let pool = SessionPool::new(sample_rules(), Arc::clone(&store));
    let handle = pool.session("whitney", t0()).unwrap();
    let mut rng = StdRng::seed_from_u64(21);

    store.down.store(true, Ordering::SeqCst);
    handle.lock().unwrap().roll(&mut rng, at(1)).unwrap();
    assert!(handle.lock().unwrap().last_persistence_warning().is_some());

    store.down.store(false, Ordering::SeqCst);
    let result = handle.lock().unwrap().roll(&mut rng, at(2)).unwrap();
    assert!(result.persistence_warning.is_none());
    assert!(handle.lock().unwrap().last_persistence_warning().is_none());
    assert_eq!(store.load("whitney").unwrap().unwrap().packs_opened, 2);
}

#[test]
fn concurrent_rolls_for_one_user_are_serialized() {
    let store = Arc::new(FlakyStore::default());
    let pool = Arc::new(SessionPool::new(sample_rules(), Arc::clone(&store)));
    pool.session("janine", t0()).unwrap();

    // Instants may arrive out of order and be rate limited; each landed roll counts once.
    let threads: Vec<_> = (1..=3)
        .map(|i| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let handle = pool.session("janine", t0()).unwrap();
                let mut rng = StdRng::seed_from_u64(i as u64);
                let mut session = handle.lock().unwrap();
                session.roll(&mut rng, at(i)).map(|r| r.cards.len())
            })
        })
        .collect();
    let outcomes: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    let handle = pool.session("janine", t0()).unwrap();
    let session = handle.lock().unwrap();
    let landed = outcomes.iter().filter(|o| o.is_ok()).count() as u64;
    assert_eq!(session.progress().packs_opened, landed);
    assert_eq!(session.progress().cards_collected, landed * 5);
    assert_eq!(session.progress().coins, 3 - landed as i32);
}

#[test]
fn failed_evict_keeps_unsaved_progress_pooled() {
    let store = Arc::new(FlakyStore::default());
    let pool = SessionPool::new(sample_rules(), Arc::clone(&store));
    let handle = pool.session("erika", t0()).unwrap();
    store.down.store(true, Ordering::SeqCst);

    let mut rng = StdRng::seed_from_u64(5);
    handle.lock().unwrap().roll(&mut rng, at(1)).unwrap();
    drop(handle);

    assert!(matches!(
        pool.evict("Erika"),
        Err(GachaError::PersistenceFailure(_))
    ));
    assert_eq!(pool.len(), 1);

    store.down.store(false, Ordering::SeqCst);
    let handle = pool.session("erika", at(2)).unwrap();
    assert_eq!(handle.lock().unwrap().progress().packs_opened, 1);
    drop(handle);

    pool.evict("erika").unwrap();
    assert!(pool.is_empty());
    assert_eq!(store.load("erika").unwrap().unwrap().packs_opened, 1);
}
