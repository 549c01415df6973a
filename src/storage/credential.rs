//! API key persistence.

use crate::error::Result;
use crate::storage::kv::KeyValueStore;

/// Storage key for the API key.
pub const CREDENTIAL_KEY: &str = "freeai_api_key";

/// Loads and saves the bearer token.
pub trait CredentialStore: Send + Sync {
    /// Reads the stored key. A blank value counts as none.
    fn load_credential(&self) -> Result<Option<String>>;

    /// Stores `credential`, replacing the previous key.
    fn save_credential(&self, credential: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> CredentialStore for T {
    fn load_credential(&self) -> Result<Option<String>> {
        Ok(self
            .get(CREDENTIAL_KEY)?
            .filter(|credential| !credential.trim().is_empty()))
    }

    fn save_credential(&self, credential: &str) -> Result<()> {
        self.set(CREDENTIAL_KEY, credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{JsonFileStore, MemoryStore};

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::in_dir(dir.path())
            .save_credential("tgp_v1_abc")
            .unwrap();

        let loaded = JsonFileStore::in_dir(dir.path()).load_credential().unwrap();
        assert_eq!(loaded.as_deref(), Some("tgp_v1_abc"));
    }

    #[test]
    fn test_blank_credential_loads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.load_credential().unwrap(), None);

        store.set(CREDENTIAL_KEY, "  ").unwrap();
        assert_eq!(store.load_credential().unwrap(), None);
    }
}
