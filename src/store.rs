//! JSON-file persistence.
//!
//! The whole database is one JSON document. Reads parse the file, writes go
//! to `<path>.tmp` and are renamed over the original. A process-wide mutex
//! serializes read-modify-write cycles.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::advice::AdviceSink;
use crate::models::{AdviceRecord, Db, OwnerId, ScheduleEntry};
use crate::timerange::TimeRange;

pub const DEFAULT_DB_PATH: &str = "data/db.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed database {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read access to schedule entries, scoped to one owner.
pub trait EntryRepository {
    /// Entries of `owner`, optionally only those starting inside `range`.
    fn list_entries(&self, owner: OwnerId, range: Option<TimeRange>) -> StoreResult<Vec<ScheduleEntry>>;
}

pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty database if none exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = JsonStore {
            path: path.into(),
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            tracing::info!(path = %store.path.display(), "Creating empty database");
            store.write(&Db::default())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> StoreResult<Db> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        if text.trim().is_empty() {
            return Ok(Db::default());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, db: &Db) -> StoreResult<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(db).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        fs::write(&tmp_path, text).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Snapshot of the whole database.
    pub fn load(&self) -> StoreResult<Db> {
        let _guard = self.lock.lock();
        self.read()
    }

    /// Run `f` against the current database and persist the result.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut Db) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock.lock();
        let mut db = self.read()?;
        let out = f(&mut db)?;
        self.write(&db)?;
        Ok(out)
    }
}

impl EntryRepository for JsonStore {
    fn list_entries(&self, owner: OwnerId, range: Option<TimeRange>) -> StoreResult<Vec<ScheduleEntry>> {
        let db = self.load()?;
        let mut entries: Vec<ScheduleEntry> = db
            .schedules
            .into_iter()
            .filter(|e| e.owner == owner)
            .filter(|e| range.is_none_or(|r| r.start <= e.start && e.start <= r.end))
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }
}

impl AdviceSink for JsonStore {
    fn append(&self, owner: OwnerId, category: &str, text: &str, at: DateTime<FixedOffset>) {
        let record = AdviceRecord {
            id: Uuid::new_v4(),
            owner,
            category: category.to_string(),
            text: text.to_string(),
            created_at: at,
        };
        let result = self.update(|db| {
            db.suggestions.push(record);
            Ok::<_, StoreError>(())
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, %owner, category, "Failed to record advice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::testutil::{dt, entry};
    use std::sync::Arc;

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("data").join("db.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_an_empty_database() {
        let (_dir, store) = temp_store();
        assert!(store.path().exists());
        let db = store.load().unwrap();
        assert!(db.users.is_empty() && db.schedules.is_empty());
    }

    #[test]
    fn failed_update_writes_nothing() {
        let (_dir, store) = temp_store();
        let owner = Uuid::new_v4();
        let result: Result<(), StoreError> = store.update(|db| {
            db.schedules.push(entry(owner, "x", "2025-03-03T09:00:00+00:00", 60, Category::Work, false));
            Err(StoreError::Io {
                path: PathBuf::from("x"),
                source: io::Error::other("boom"),
            })
        });
        assert!(result.is_err());
        assert!(store.load().unwrap().schedules.is_empty());
    }

    #[test]
    fn list_entries_is_owner_scoped_and_sorted() {
        let (_dir, store) = temp_store();
        let (me, you) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .update(|db| {
                db.schedules.push(entry(me, "late", "2025-03-05T09:00:00+00:00", 60, Category::Work, false));
                db.schedules.push(entry(you, "theirs", "2025-03-04T09:00:00+00:00", 60, Category::Work, false));
                db.schedules.push(entry(me, "early", "2025-03-03T09:00:00+00:00", 60, Category::Study, true));
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let all = store.list_entries(me, None).unwrap();
        let titles: Vec<&str> = all.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);

        let range = TimeRange::new(dt("2025-03-04T00:00:00+00:00"), dt("2025-03-06T00:00:00+00:00")).unwrap();
        let some = store.list_entries(me, Some(range)).unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].title, "late");
    }

    #[test]
    fn malformed_file_is_reported() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json { .. })));
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        let owner = Uuid::new_v4();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.append(owner, "chat", &format!("reply {i}"), dt("2025-03-03T09:00:00+00:00"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let db = store.load().unwrap();
        assert_eq!(db.suggestions.len(), 8);
        assert!(db.suggestions.iter().all(|s| s.owner == owner && s.category == "chat"));
    }
}
