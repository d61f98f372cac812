//! Lazy, write-through storage of one JSON file per user.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::{MemoryError, Result};
use crate::record::{RECORD_VERSION, UserRecord};

/// Maps user ids to resident records backed by files under `dir`.
///
/// Records are loaded on first reference and stay resident for the life of
/// the store. Each record sits behind its own async mutex, so work on
/// different users never contends while work on the same user is serialized.
#[derive(Debug)]
pub struct RecordStore {
    dir: PathBuf,
    records: DashMap<String, Arc<Mutex<UserRecord>>>,
}

impl RecordStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!("RecordStore rooted at {}", dir.display());
        Self {
            dir,
            records: DashMap::new(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the durable file for `user_id`.
    #[must_use]
    pub fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("user_{user_id}.json"))
    }

    /// Number of records currently held in memory.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.records.len()
    }

    /// Resident record for `user_id`, loading it from disk or creating a
    /// default one on first reference.
    ///
    /// A freshly created default is not written until it is first mutated.
    /// A file that exists but cannot be read or parsed is an error; it is
    /// never replaced by an empty record.
    pub async fn get_or_create(&self, user_id: &str) -> Result<Arc<Mutex<UserRecord>>> {
        validate_user_id(user_id)?;

        if let Some(handle) = self.records.get(user_id) {
            return Ok(Arc::clone(handle.value()));
        }

        let record = match self.load(user_id).await? {
            Some(record) => record,
            None => {
                debug!("No stored record for user {user_id}, starting fresh");
                UserRecord::new()
            }
        };

        // Another task may have loaded the same user meanwhile; first insert wins.
        let handle = Arc::clone(
            self.records
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(record)))
                .value(),
        );
        Ok(handle)
    }

    /// Enter the exclusive section for `user_id`.
    ///
    /// Everything done through the returned guard, including
    /// [`RecordGuard::persist`], happens without interleaving with any other
    /// operation on the same user.
    pub async fn lock(&self, user_id: &str) -> Result<RecordGuard<'_>> {
        let handle = self.get_or_create(user_id).await?;
        let guard = handle.lock_owned().await;
        Ok(RecordGuard {
            store: self,
            user_id: user_id.to_string(),
            guard,
        })
    }

    /// Write the resident record for `user_id`, overwriting any previous file.
    pub async fn persist(&self, user_id: &str) -> Result<()> {
        let guard = self.lock(user_id).await?;
        guard.persist().await
    }

    async fn load(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let path = self.path_for(user_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MemoryError::Read { path, source }),
        };

        let mut record: UserRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(source) => return Err(MemoryError::Corrupt { path, source }),
        };

        if record.version > RECORD_VERSION {
            return Err(MemoryError::UnsupportedVersion {
                path,
                found: record.version,
                supported: RECORD_VERSION,
            });
        }

        record.normalize();
        info!(
            "Loaded record for user {user_id}: {} messages, size {}",
            record.len(),
            record.total_size()
        );
        Ok(Some(record))
    }

    async fn write(&self, user_id: &str, record: &UserRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| MemoryError::Write {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(user_id);
        let json = serde_json::to_vec_pretty(record).map_err(|source| MemoryError::Encode {
            user_id: user_id.to_string(),
            source,
        })?;

        // Write beside the target and rename so a crash never leaves half a file.
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|source| MemoryError::Write {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| MemoryError::Write {
                path: path.clone(),
                source,
            })?;

        debug!("Persisted record for user {user_id} to {}", path.display());
        Ok(())
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
    if valid {
        Ok(())
    } else {
        Err(MemoryError::InvalidUserId(user_id.to_string()))
    }
}

/// Exclusive access to one user's resident record.
pub struct RecordGuard<'a> {
    store: &'a RecordStore,
    user_id: String,
    guard: OwnedMutexGuard<UserRecord>,
}

impl RecordGuard<'_> {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Write the guarded record through to storage.
    pub async fn persist(&self) -> Result<()> {
        self.store.write(&self.user_id, &self.guard).await
    }

    /// Apply `change` to a copy of the record and make it resident only once
    /// the copy is on disk. On a failed write the resident record is left as
    /// it was.
    pub async fn update<T, F>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut UserRecord) -> T,
    {
        let mut next = UserRecord::clone(&self.guard);
        let out = change(&mut next);
        self.store.write(&self.user_id, &next).await?;
        *self.guard = next;
        Ok(out)
    }
}

impl Deref for RecordGuard<'_> {
    type Target = UserRecord;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for RecordGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
