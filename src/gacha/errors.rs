use thiserror::Error;

/// Errors that can arise while rolling packs, claiming rewards, or talking to the store.
#[derive(Debug, Error)]
pub enum GachaError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around JSON errors from catalog and achievement files.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, reading data files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A second roll arrived inside the minimum roll spacing.
    #[error("rolling too fast, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: i64 },

    /// Not enough coins for the requested operation.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Persisted progress held an impossible value and was repaired.
    #[error("corrupted state repaired: {0}")]
    CorruptedState(String),

    /// Claim attempted before the requirement was met.
    #[error("achievement not completed yet: {0}")]
    NotCompleted(String),

    /// Claim attempted for an achievement whose reward was already granted.
    #[error("achievement already claimed: {0}")]
    AlreadyClaimed(String),

    /// The achievement id is not part of the loaded achievement book.
    #[error("unknown achievement: {0}")]
    UnknownAchievement(String),

    /// Equip attempted for a title the user has not unlocked.
    #[error("title not owned: {0}")]
    TitleNotOwned(String),

    /// The durable store rejected a write. In-memory progress is kept.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// Pack generation gave up because a rarity tier kept coming up empty.
    #[error("catalog misconfigured: no full pack after {attempts} attempts")]
    CatalogMisconfigured { attempts: u32 },

    /// Catalog data violated an entry invariant at load time.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// User id failed validation.
    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}
