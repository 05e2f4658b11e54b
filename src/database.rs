//! Document store built on the embedded redb database
//!
//! Profiles are stored as JSON documents keyed by email. Each mutation runs
//! inside a single write transaction, so a read-modify-write of one profile
//! is atomic with respect to other requests.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;
use tracing::debug;

use crate::auth::TokenKeys;
use crate::model::{Draft, Profile};
use crate::uploader::MediaUploader;

/// Main table for profile documents
///
/// Key: email, matched exactly
/// Value: JSON-serialized `Profile`
pub const TABLE_PROFILES: TableDefinition<&str, &str> = TableDefinition::new("profiles_v1");

/// Saved drafts, one row per save
///
/// Key: Composite key in format "{email}:{created_at_micros}:{id}"
/// Value: JSON-serialized `Draft`
///
/// The timestamp in the key keeps a user's drafts in insertion order.
pub const TABLE_DRAFTS: TableDefinition<&str, &str> = TableDefinition::new("drafts_v1");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("corrupt document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Initializes the embedded database and creates required tables
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "portfolio.db")
pub fn init_db(db_path: &str) -> Result<Database, StoreError> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_PROFILES)?;
        write_txn.open_table(TABLE_DRAFTS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Result of a successful `ProfileStore::update`
#[derive(Debug)]
pub struct Updated<T> {
    /// Whatever the update closure returned
    pub value: T,
    /// Whether the stored document actually changed
    pub modified: bool,
}

/// Handle to the profile and draft tables
///
/// Cheap to clone; every clone shares the same database.
#[derive(Clone)]
pub struct ProfileStore {
    db: Arc<Database>,
}

impl ProfileStore {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Opens (or creates) the database file and wraps it in a store
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(db_path)?))
    }

    /// Exact-match lookup by email
    pub fn find(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_PROFILES)?;

        match table.get(email)? {
            Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Returns every stored profile
    pub fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_PROFILES)?;

        let mut profiles = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            profiles.push(serde_json::from_str(value.value())?);
        }
        Ok(profiles)
    }

    /// Inserts a new profile
    ///
    /// Returns `false` without writing if a profile with the same email exists.
    pub fn insert(&self, profile: &Profile) -> Result<bool, StoreError> {
        let record_json = serde_json::to_string(profile)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_PROFILES)?;
            if table.get(profile.email.as_str())?.is_some() {
                return Ok(false);
            }
            table.insert(profile.email.as_str(), record_json.as_str())?;
        }
        write_txn.commit()?;

        debug!("Inserted profile {}", profile.email);
        Ok(true)
    }

    /// Applies `apply` to the stored profile inside one write transaction
    ///
    /// Returns `Ok(None)` when no profile exists for `email`. If `apply`
    /// fails the transaction is dropped and nothing is written. The document
    /// is only rewritten when `apply` actually changed it.
    pub fn update<T, E, F>(&self, email: &str, apply: F) -> Result<Option<Updated<T>>, E>
    where
        F: FnOnce(&mut Profile) -> Result<T, E>,
        E: From<StoreError>,
    {
        let write_txn = self.db.begin_write().map_err(StoreError::from)?;
        let outcome = {
            let mut table = write_txn
                .open_table(TABLE_PROFILES)
                .map_err(StoreError::from)?;

            let stored = match table.get(email).map_err(StoreError::from)? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(None),
            };
            let mut profile: Profile = serde_json::from_str(&stored).map_err(StoreError::from)?;
            let before = profile.clone();

            let value = apply(&mut profile)?;

            let modified = profile != before;
            if modified {
                let record_json = serde_json::to_string(&profile).map_err(StoreError::from)?;
                table
                    .insert(email, record_json.as_str())
                    .map_err(StoreError::from)?;
            }
            Updated { value, modified }
        };
        write_txn.commit().map_err(StoreError::from)?;

        Ok(Some(outcome))
    }

    /// Stores a new draft record; drafts are never updated in place
    pub fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let record_json = serde_json::to_string(draft)?;
        let key = format!(
            "{}:{}:{}",
            draft.email,
            draft.created_at.timestamp_micros(),
            draft.id
        );

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_DRAFTS)?;
            table.insert(key.as_str(), record_json.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Lists a user's drafts, oldest first
    pub fn drafts_for(&self, email: &str) -> Result<Vec<Draft>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_DRAFTS)?;

        // ';' sorts right after ':', bounding the "{email}:" prefix
        let start_key = format!("{}:", email);
        let end_key = format!("{};", email);

        let mut drafts = Vec::new();
        for entry in table.range(start_key.as_str()..end_key.as_str())? {
            let (_, value) = entry?;
            let draft: Draft = serde_json::from_str(value.value())?;
            if draft.email == email {
                drafts.push(draft);
            }
        }
        Ok(drafts)
    }
}

/// Application state shared across all request handlers
///
/// Built once at startup and cloned into every handler by axum.
#[derive(Clone)]
pub struct AppState {
    pub store: ProfileStore,
    pub uploader: Arc<dyn MediaUploader>,
    pub tokens: TokenKeys,
    /// Whether mutating profile routes demand a bearer token
    pub require_auth: bool,
}

impl AppState {
    pub fn new(
        store: ProfileStore,
        uploader: Arc<dyn MediaUploader>,
        tokens: TokenKeys,
        require_auth: bool,
    ) -> Self {
        Self {
            store,
            uploader,
            tokens,
            require_auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DraftData, GalleryItem};
    use crate::error::AppError;
    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    fn temp_store() -> (ProfileStore, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let store = ProfileStore::open(temp_db.path().to_str().unwrap()).unwrap();
        (store, temp_db)
    }

    #[test]
    fn insert_rejects_duplicate_email() {
        let (store, _temp_db) = temp_store();
        assert!(store.insert(&Profile::new("A", "a@x.com")).unwrap());
        assert!(!store.insert(&Profile::new("B", "a@x.com")).unwrap());
        assert_eq!(store.find("a@x.com").unwrap().unwrap().name.as_deref(), Some("A"));
        assert!(store.find("A@x.com").unwrap().is_none());
    }

    #[test]
    fn update_reports_modification_and_missing_profiles() {
        let (store, _temp_db) = temp_store();
        store.insert(&Profile::new("A", "a@x.com")).unwrap();

        let missing = store
            .update::<_, StoreError, _>("nobody@x.com", |_| Ok(()))
            .unwrap();
        assert!(missing.is_none());

        let untouched = store
            .update::<_, StoreError, _>("a@x.com", |_| Ok(()))
            .unwrap()
            .unwrap();
        assert!(!untouched.modified);

        let pushed = store
            .update::<_, StoreError, _>("a@x.com", |profile| {
                profile.gallery.push(GalleryItem {
                    image: "u1".into(),
                    title: "T".into(),
                });
                Ok(profile.gallery.len())
            })
            .unwrap()
            .unwrap();
        assert!(pushed.modified);
        assert_eq!(pushed.value, 1);
        assert_eq!(store.find("a@x.com").unwrap().unwrap().gallery.len(), 1);
    }

    #[test]
    fn failed_update_writes_nothing() {
        let (store, _temp_db) = temp_store();
        store.insert(&Profile::new("A", "a@x.com")).unwrap();

        let result = store.update("a@x.com", |profile| {
            profile.bio = Some("changed".into());
            Err::<(), _>(AppError::validation("nope"))
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.find("a@x.com").unwrap().unwrap().bio, None);
    }

    #[test]
    fn drafts_are_listed_per_email_in_insertion_order() {
        let (store, _temp_db) = temp_store();
        let now = Utc::now();
        let draft = |id: &str, email: &str, offset: i64| Draft {
            id: id.to_string(),
            email: email.to_string(),
            draft_data: DraftData { files: vec![] },
            created_at: now + Duration::seconds(offset),
        };

        store.insert_draft(&draft("second", "a@x.com", 2)).unwrap();
        store.insert_draft(&draft("first", "a@x.com", 1)).unwrap();
        store.insert_draft(&draft("other", "b@x.com", 0)).unwrap();

        let ids: Vec<String> = store
            .drafts_for("a@x.com")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
