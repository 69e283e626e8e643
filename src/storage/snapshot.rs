// ============================================================================
// SNAPSHOT STORE - Durable copies of the ledger state
// ============================================================================
//
// The engine itself is storage-agnostic. The server binary periodically
// writes the full `LedgerState` here and restores the newest copy on boot.
//
// Layout (ReDB):
//   snapshots: version (u64) → JSON-encoded LedgerState
//   metadata:  "latest_version" → u64
//
// Only the newest `SNAPSHOTS_RETAINED` versions are kept.
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{info, warn};

use super::LedgerState;

const SNAPSHOTS: TableDefinition<u64, &[u8]> = TableDefinition::new("snapshots");
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const LATEST_KEY: &str = "latest_version";

/// Number of versions kept on disk.
pub const SNAPSHOTS_RETAINED: u64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot version {0} is missing")]
    MissingVersion(u64),
}

fn storage_err<E: Into<redb::Error>>(e: E) -> SnapshotError {
    SnapshotError::Storage(e.into())
}

/// ReDB-backed snapshot persistence.
#[derive(Clone)]
pub struct SnapshotStore {
    db: Arc<Database>,
}

impl SnapshotStore {
    /// Create or open `<dir>/ledger.redb`.
    pub fn open(dir: &str) -> Result<Self, SnapshotError> {
        std::fs::create_dir_all(dir)?;
        let path = Path::new(dir).join("ledger.redb");
        info!(path = %path.display(), "Opening snapshot database");

        let db = Database::create(path).map_err(storage_err)?;

        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _ = write_txn.open_table(SNAPSHOTS).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Newest stored version, if any.
    pub fn latest_version(&self) -> Result<Option<u64>, SnapshotError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(METADATA).map_err(storage_err)?;
        let version = table.get(LATEST_KEY).map_err(storage_err)?.map(|v| v.value());
        Ok(version)
    }

    /// Persist `state` as a new version and prune old ones.
    pub fn save(&self, state: &LedgerState) -> Result<u64, SnapshotError> {
        let bytes = serde_json::to_vec(state)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let version = {
            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
            let version = meta.get(LATEST_KEY).map_err(storage_err)?.map(|v| v.value()).unwrap_or(0) + 1;
            meta.insert(LATEST_KEY, version).map_err(storage_err)?;

            let mut snapshots = write_txn.open_table(SNAPSHOTS).map_err(storage_err)?;
            snapshots.insert(version, bytes.as_slice()).map_err(storage_err)?;

            if version > SNAPSHOTS_RETAINED {
                let cutoff = version - SNAPSHOTS_RETAINED + 1;
                let stale: Vec<u64> = snapshots
                    .range(..cutoff)
                    .map_err(storage_err)?
                    .filter_map(|entry| entry.ok().map(|(k, _)| k.value()))
                    .collect();
                for old in stale {
                    snapshots.remove(old).map_err(storage_err)?;
                }
            }
            version
        };
        write_txn.commit().map_err(storage_err)?;

        info!(version, bytes = bytes.len(), "Snapshot saved");
        Ok(version)
    }

    /// Load a specific version.
    pub fn load(&self, version: u64) -> Result<LedgerState, SnapshotError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SNAPSHOTS).map_err(storage_err)?;
        let guard = table
            .get(version)
            .map_err(storage_err)?
            .ok_or(SnapshotError::MissingVersion(version))?;
        let state = serde_json::from_slice(guard.value())?;
        Ok(state)
    }

    /// Load the newest snapshot, `None` on a fresh database.
    pub fn load_latest(&self) -> Result<Option<LedgerState>, SnapshotError> {
        match self.latest_version()? {
            Some(version) => self.load(version).map(Some),
            None => {
                warn!("No snapshot found, starting with an empty ledger");
                Ok(None)
            }
        }
    }
}
