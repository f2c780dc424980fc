use super::backend::StorageBackend;
use crate::error::{DealerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const VALUE_EXT: &str = ".json";

/// File-per-key backend rooted at the data directory.
///
/// Keys map to `{root}/{key}.json`. Keys are restricted to a filename-safe alphabet;
/// the storage and backup keys produced by this crate always are.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DealerError::Io)?;
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
            && !key.starts_with('.');
        if !valid {
            return Err(DealerError::Store(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(format!("{}{}", key, VALUE_EXT)))
    }
}

impl StorageBackend for FsBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(DealerError::Io)?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;
        let target = self.key_path(key)?;

        // Atomic write
        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, value).map_err(DealerError::Io)?;
        fs::rename(&tmp, target).map_err(DealerError::Io)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(path).map_err(DealerError::Io)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(DealerError::Io)? {
            let path = entry.map_err(DealerError::Io)?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
                if let Some(key) = name.strip_suffix(VALUE_EXT) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InventoryState;
    use crate::store::DataStore;
    use crate::test_utils::{vehicle, TestEnv};

    #[test]
    fn set_get_remove() {
        let env = TestEnv::new();
        let backend = FsBackend::new(env.root.join("nested"));

        assert_eq!(backend.get("a").unwrap(), None);
        backend.set("a", "[1]").unwrap();
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("[1]"));
        assert!(env.root.join("nested/a.json").exists());

        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
    }

    #[test]
    fn keys_skip_temp_and_foreign_files() {
        let env = TestEnv::new();
        let backend = FsBackend::new(env.root.clone());
        backend.set("dealer-inventory", "{}").unwrap();
        fs::write(env.root.join(".leftover.tmp"), "x").unwrap();
        fs::write(env.root.join("notes.txt"), "x").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["dealer-inventory".to_string()]);
    }

    #[test]
    fn rejects_path_like_keys() {
        let env = TestEnv::new();
        let backend = FsBackend::new(env.root.clone());
        assert!(backend.set("../escape", "x").is_err());
        assert!(backend.set(".hidden", "x").is_err());
        assert!(backend.get("").is_err());
    }

    #[test]
    fn state_survives_reopen() {
        let env = TestEnv::new();
        let mut store = env.store();
        let state = InventoryState::with_vehicles(vec![vehicle("Kia", "Soul", 12_000.0)]);
        store.write_backup(&[]).unwrap();
        store.save_state(&state).unwrap();

        let reopened = env.store();
        let outcome = reopened.load_state().unwrap();
        assert_eq!(outcome.state.vehicles, state.vehicles);
        assert_eq!(reopened.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_file_recovers_from_backup_on_disk() {
        let env = TestEnv::new();
        let mut store = env.store();
        let kept = vehicle("Kia", "Soul", 12_000.0);
        store.write_backup(std::slice::from_ref(&kept)).unwrap();
        fs::write(env.root.join("dealer-inventory.json"), "{ truncated").unwrap();

        let outcome = env.store().load_state().unwrap();
        assert!(outcome.recovered_from.is_some());
        assert_eq!(outcome.state.vehicles, vec![kept]);
    }
}
