#![warn(missing_docs)]
//! FreeAI Studio - prompt-to-image generation against Together.AI.
//!
//! The crate wraps one request lifecycle: validate the form, mark the
//! session busy, call the API, record the result, and report every state
//! change to a [`Presenter`]. Only one generation runs at a time per
//! [`Studio`]; a submit while one is in flight is ignored.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use freeai_studio::{GenerationForm, JsonFileStore, Studio, StudioConfig, TogetherClient};
//!
//! #[tokio::main]
//! async fn main() -> freeai_studio::Result<()> {
//!     let config = StudioConfig::from_env();
//!     let store = Arc::new(JsonFileStore::in_dir(config.resolve_data_dir()));
//!     let studio = Studio::builder(Arc::new(TogetherClient::default()))
//!         .config(config)
//!         .credentials(store.clone())
//!         .history(store)
//!         .build();
//!
//!     studio.set_credential("tgp_v1_...")?;
//!     let form = GenerationForm::new("A lighthouse at dusk").with_size(1024, 768);
//!     if let Some(result) = studio.submit(&form).await? {
//!         println!("{}", result.image_url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `freeai` command-line front end

mod error;
pub mod export;
pub mod image;
pub mod storage;
pub mod studio;

// Re-export error types at crate root
pub use error::{Result, StudioError};

pub use export::{ClipboardWriter, DirectorySaver, FileSaver, Osc52Clipboard};
pub use image::providers::{TogetherClient, TogetherClientBuilder};
pub use image::{
    validate, GenerationForm, GenerationRequest, GenerationResult, ImageService, Model,
    ValidationRules,
};
pub use storage::{CredentialStore, Gallery, HistoryStore, JsonFileStore, KeyValueStore};
pub use studio::{Notice, NoticeKind, Presenter, Studio, StudioBuilder, StudioConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::image::{GenerationForm, GenerationResult, ImageService, Model};
    pub use crate::studio::{Presenter, Studio, StudioConfig};
    pub use crate::TogetherClient;
}
