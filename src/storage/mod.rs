//! Durable state: the API key and the gallery.

pub mod credential;
pub mod history;
pub mod kv;

pub use credential::{CredentialStore, CREDENTIAL_KEY};
pub use history::{Gallery, HistoryStore, HISTORY_KEY, HISTORY_LIMIT};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
