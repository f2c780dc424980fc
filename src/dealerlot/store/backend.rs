use crate::error::Result;

/// Abstract interface for the raw key/value medium.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`super::persistence`] and [`super::backup`] handle the "what" (document
/// layout, recovery, retention).
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if nothing is stored there.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;
}
