//! # Storage Layer
//!
//! This module defines the storage abstraction for dealerlot. The [`DataStore`] trait
//! is what the API layer talks to; [`DealerStore`] implements it on top of any
//! [`backend::StorageBackend`].
//!
//! ## Two Layers
//!
//! - [`backend::StorageBackend`]: a dumb key/value medium (get/set/remove/keys).
//!   - [`fs_backend::FsBackend`]: production, one JSON file per key.
//!   - [`mem_backend::MemBackend`]: in-memory, for tests.
//! - [`DealerStore`]: knows the document layout.
//!   - [`persistence`]: the versioned state document and its load-time recovery.
//!   - [`backup`]: the timestamped backup ledger and its retention policy.
//!
//! ## Storage Format
//!
//! For `FsBackend`:
//! ```text
//! <data dir>/
//! ├── dealer-inventory.json                               # {"version": 1, "state": {...}}
//! ├── dealer-inventory-backup-20240301T101500.123456Z.json # raw vehicle array
//! ├── dealer-inventory-backup-20240301T101733.004211Z.json
//! └── config.json
//! ```

use crate::error::Result;
use crate::model::Vehicle;
use crate::state::InventoryState;

pub mod backend;
pub mod backup;
pub mod fs_backend;
pub mod mem_backend;
pub mod persistence;

pub use backup::BackupEntry;
pub use persistence::{LoadOutcome, SCHEMA_VERSION};

use backend::StorageBackend;
use fs_backend::FsBackend;
use mem_backend::MemBackend;

pub const DEFAULT_STORAGE_KEY: &str = "dealer-inventory";
pub const DEFAULT_BACKUP_RETENTION: usize = 20;

/// Abstract interface for dealer state storage.
pub trait DataStore {
    /// Load the persisted state, recovering from the backup ledger when the
    /// document is unusable.
    fn load_state(&self) -> Result<LoadOutcome>;

    /// Persist the full state document.
    fn save_state(&mut self, state: &InventoryState) -> Result<()>;

    /// Write a timestamped copy of `vehicles` to the backup ledger.
    fn write_backup(&mut self, vehicles: &[Vehicle]) -> Result<BackupEntry>;

    /// All backups, oldest first.
    fn list_backups(&self) -> Result<Vec<BackupEntry>>;

    /// Vehicles stored in one backup entry.
    fn read_backup(&self, entry: &BackupEntry) -> Result<Vec<Vehicle>>;

    /// Apply the retention policy. Returns how many entries were removed.
    fn prune_backups(&mut self) -> Result<usize>;

    fn backup_retention(&self) -> usize;
}

/// The production [`DataStore`], generic over the raw medium.
pub struct DealerStore<B: StorageBackend> {
    pub(crate) backend: B,
    storage_key: String,
    backup_retention: usize,
}

pub type FileStore = DealerStore<FsBackend>;
pub type InMemoryStore = DealerStore<MemBackend>;

impl<B: StorageBackend> DealerStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }

    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = key.to_string();
        self
    }

    /// Keep at most `retention` backups; `0` keeps everything.
    pub fn with_backup_retention(mut self, retention: usize) -> Self {
        self.backup_retention = retention;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_backend(MemBackend::new())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> DataStore for DealerStore<B> {
    fn load_state(&self) -> Result<LoadOutcome> {
        self.load_document()
    }

    fn save_state(&mut self, state: &InventoryState) -> Result<()> {
        self.save_document(state)
    }

    fn write_backup(&mut self, vehicles: &[Vehicle]) -> Result<BackupEntry> {
        let entry = self.append_backup(vehicles)?;
        self.apply_retention()?;
        Ok(entry)
    }

    fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.backup_entries()
    }

    fn read_backup(&self, entry: &BackupEntry) -> Result<Vec<Vehicle>> {
        self.backup_vehicles(entry)
    }

    fn prune_backups(&mut self) -> Result<usize> {
        self.apply_retention()
    }

    fn backup_retention(&self) -> usize {
        self.backup_retention
    }
}
