use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sled::IVec;

use crate::gacha::errors::GachaError;
use crate::gacha::types::{UserProgress, USER_SCHEMA_VERSION};

const TREE_USERS: &str = "pokeroller_users";

/// Durable home for per-user progress.
pub trait ProgressStore: Send + Sync {
    /// `Ok(None)` when the user has never been saved.
    fn load(&self, user_id: &str) -> Result<Option<UserProgress>, GachaError>;
    fn save(&self, user_id: &str, progress: &UserProgress) -> Result<(), GachaError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GachaStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl GachaStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Remove the database files when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<GachaStore, GachaError> {
        GachaStore::open_with_options(self.path, self.temporary)
    }
}

/// One row of the packs-opened leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub packs_opened: u64,
    pub level: u32,
    pub equipped_title: Option<String>,
}

/// Sled-backed persistence for user progress.
pub struct GachaStore {
    _db: sled::Db,
    users: sled::Tree,
}

impl GachaStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GachaError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, GachaError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new()
            .path(path_ref)
            .temporary(temporary)
            .open()?;
        let users = db.open_tree(TREE_USERS)?;
        Ok(Self { _db: db, users })
    }

    fn user_key(user_id: &str) -> Vec<u8> {
        format!("users:{}", user_id.to_ascii_lowercase()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GachaError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GachaError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn decode_user(bytes: IVec) -> Result<UserProgress, GachaError> {
        let record: UserProgress = Self::deserialize(bytes)?;
        if record.schema_version != USER_SCHEMA_VERSION {
            return Err(GachaError::SchemaMismatch {
                entity: "user",
                expected: USER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Insert or update a user's progress.
    pub fn put_user(&self, progress: &UserProgress) -> Result<(), GachaError> {
        let mut record = progress.clone();
        record.schema_version = USER_SCHEMA_VERSION;
        let key = Self::user_key(&record.user_id);
        let bytes = Self::serialize(&record)?;
        self.users.insert(key, bytes)?;
        self.users.flush()?;
        Ok(())
    }

    /// Fetch a user's progress.
    pub fn get_user(&self, user_id: &str) -> Result<UserProgress, GachaError> {
        let key = Self::user_key(user_id);
        let Some(bytes) = self.users.get(&key)? else {
            return Err(GachaError::NotFound(format!("user: {}", user_id)));
        };
        Self::decode_user(bytes)
    }

    /// List all stored user ids (lower-cased keys).
    pub fn list_user_ids(&self) -> Result<Vec<String>, GachaError> {
        let mut ids = Vec::new();
        for entry in self.users.scan_prefix(b"users:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(user_id) = text.strip_prefix("users:") {
                ids.push(user_id.to_string());
            }
        }
        Ok(ids)
    }

    /// Remove a user's record. Returns whether one existed.
    pub fn delete_user(&self, user_id: &str) -> Result<bool, GachaError> {
        let existed = self.users.remove(Self::user_key(user_id))?.is_some();
        self.users.flush()?;
        if existed {
            log::info!("store: deleted user {}", user_id);
        }
        Ok(existed)
    }

    /// Top users by packs opened, then level, then id.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GachaError> {
        let mut rows = Vec::new();
        for entry in self.users.scan_prefix(b"users:") {
            let (_, bytes) = entry?;
            match Self::decode_user(bytes) {
                Ok(p) => rows.push(LeaderboardEntry {
                    user_id: p.user_id,
                    packs_opened: p.packs_opened,
                    level: p.level,
                    equipped_title: p.equipped_title,
                }),
                Err(e) => log::warn!("store: skipping unreadable user record: {}", e),
            }
        }
        rows.sort_by(|a, b| {
            b.packs_opened
                .cmp(&a.packs_opened)
                .then(b.level.cmp(&a.level))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

impl ProgressStore for GachaStore {
    fn load(&self, user_id: &str) -> Result<Option<UserProgress>, GachaError> {
        match self.get_user(user_id) {
            Ok(p) => Ok(Some(p)),
            Err(GachaError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, _user_id: &str, progress: &UserProgress) -> Result<(), GachaError> {
        self.put_user(progress)
    }
}
