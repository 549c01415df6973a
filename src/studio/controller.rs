//! The generation lifecycle.

use crate::error::Result;
use crate::export::{ClipboardWriter, DirectorySaver, FileSaver, MemoryClipboard};
use crate::image::{validate, GenerationForm, GenerationResult, ImageFormat, ImageService};
use crate::storage::{CredentialStore, Gallery, HistoryStore, MemoryStore};
use crate::studio::config::StudioConfig;
use crate::studio::presenter::{Notice, NullPresenter, Presenter};
use crate::studio::progress::{ProgressTicker, TICK_INTERVAL};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Mutable session state. Never locked across an `.await`.
#[derive(Debug, Default)]
struct Session {
    credential: String,
    current: Option<GenerationResult>,
    gallery: Gallery,
}

/// Builder for [`Studio`].
pub struct StudioBuilder {
    service: Arc<dyn ImageService>,
    config: StudioConfig,
    presenter: Arc<dyn Presenter>,
    credentials: Arc<dyn CredentialStore>,
    history: Arc<dyn HistoryStore>,
    clipboard: Arc<dyn ClipboardWriter>,
    saver: Arc<dyn FileSaver>,
    api_key: Option<String>,
}

impl StudioBuilder {
    fn new(service: Arc<dyn ImageService>) -> Self {
        let memory = Arc::new(MemoryStore::new());
        Self {
            service,
            config: StudioConfig::default(),
            presenter: Arc::new(NullPresenter),
            credentials: memory.clone(),
            history: memory,
            clipboard: Arc::new(MemoryClipboard::new()),
            saver: Arc::new(DirectorySaver::new(".")),
            api_key: None,
        }
    }

    /// Sets the session configuration.
    pub fn config(mut self, config: StudioConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where state changes are reported.
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Sets the store the API key is read from and mirrored to.
    pub fn credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = store;
        self
    }

    /// Sets the store backing the gallery.
    pub fn history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = store;
        self
    }

    /// Sets the clipboard used by [`Studio::copy_current_url`].
    pub fn clipboard(mut self, clipboard: Arc<dyn ClipboardWriter>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Sets where [`Studio::download_current`] writes files.
    pub fn saver(mut self, saver: Arc<dyn FileSaver>) -> Self {
        self.saver = saver;
        self
    }

    /// Uses this key for the session instead of the stored one. Not persisted.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builds the studio, reading the stored key and gallery once.
    ///
    /// Unreadable storage is logged and treated as empty.
    pub fn build(self) -> Studio {
        let stored = self.credentials.load_credential().unwrap_or_else(|e| {
            tracing::warn!("could not read stored API key: {e}");
            None
        });
        let credential = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or(stored)
            .unwrap_or_default();

        let gallery = if self.config.history_enabled {
            match self.history.load_history() {
                Ok(entries) => Gallery::from_entries(entries),
                Err(e) => {
                    tracing::warn!("could not read gallery, starting empty: {e}");
                    Gallery::new()
                }
            }
        } else {
            Gallery::new()
        };

        tracing::debug!(
            has_credential = !credential.is_empty(),
            gallery_len = gallery.len(),
            "studio ready"
        );

        Studio {
            service: self.service,
            config: self.config,
            presenter: self.presenter,
            credentials: self.credentials,
            history: self.history,
            clipboard: self.clipboard,
            saver: self.saver,
            generating: AtomicBool::new(false),
            session: Mutex::new(Session {
                credential,
                current: None,
                gallery,
            }),
        }
    }
}

/// Owns one user's session and runs generations one at a time.
pub struct Studio {
    service: Arc<dyn ImageService>,
    config: StudioConfig,
    presenter: Arc<dyn Presenter>,
    credentials: Arc<dyn CredentialStore>,
    history: Arc<dyn HistoryStore>,
    clipboard: Arc<dyn ClipboardWriter>,
    saver: Arc<dyn FileSaver>,
    generating: AtomicBool,
    session: Mutex<Session>,
}

/// Holds the in-flight flag; releasing it is unconditional.
struct BusyGuard<'a> {
    studio: &'a Studio,
}

impl<'a> BusyGuard<'a> {
    fn acquire(studio: &'a Studio) -> Option<Self> {
        studio
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        studio.presenter.busy(true);
        Some(Self { studio })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.studio.generating.store(false, Ordering::Release);
        self.studio.presenter.busy(false);
    }
}

impl Studio {
    /// Creates a `StudioBuilder` around the given image service.
    pub fn builder(service: Arc<dyn ImageService>) -> StudioBuilder {
        StudioBuilder::new(service)
    }

    /// The configuration this session was built with.
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// True while a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// The API key currently in effect, possibly empty.
    pub fn credential(&self) -> String {
        self.session().credential.clone()
    }

    /// Last successful result of this session.
    pub fn current(&self) -> Option<GenerationResult> {
        self.session().current.clone()
    }

    /// URL of the current image, if any.
    pub fn current_image_url(&self) -> Option<String> {
        self.session().current.as_ref().map(|r| r.image_url.clone())
    }

    /// Gallery entries, oldest first.
    pub fn gallery(&self) -> Vec<GenerationResult> {
        self.session().gallery.to_vec()
    }

    /// Updates the API key and mirrors it to storage when non-empty.
    pub fn set_credential(&self, value: &str) -> Result<()> {
        let credential = value.trim().to_string();
        self.session().credential = credential.clone();

        if credential.is_empty() {
            return Ok(());
        }
        self.credentials.save_credential(&credential)
    }

    /// Runs one generation for the given form.
    ///
    /// Returns `Ok(None)` without doing anything if another generation is
    /// already in flight. Every failure is also reported to the presenter.
    pub async fn submit(&self, form: &GenerationForm) -> Result<Option<GenerationResult>> {
        if self.is_generating() {
            tracing::debug!("generation already in flight, ignoring submit");
            return Ok(None);
        }

        let credential = self.credential();
        let request = match validate(&credential, form, self.config.validation_rules()) {
            Ok(request) => request,
            Err(e) => {
                self.presenter.error(&e.to_string());
                return Err(e);
            }
        };

        let Some(_busy) = BusyGuard::acquire(self) else {
            tracing::debug!("lost race for generation slot, ignoring submit");
            return Ok(None);
        };
        self.presenter.loading();
        let _ticker = if self.config.show_progress {
            ProgressTicker::start(Arc::clone(&self.presenter), TICK_INTERVAL)
        } else {
            ProgressTicker::idle(Arc::clone(&self.presenter))
        };

        match self.service.generate(&request, &credential).await {
            Ok(url) => {
                let result = GenerationResult::new(url, &request);
                tracing::info!(
                    url = %result.image_url,
                    model = %result.model,
                    "image generated"
                );
                self.store_result(&result);
                self.presenter.success(&result);
                Ok(Some(result))
            }
            Err(e) => {
                tracing::warn!(service = self.service.name(), "generation failed: {e}");
                self.presenter.error(&e.to_string());
                Err(e)
            }
        }
    }

    fn store_result(&self, result: &GenerationResult) {
        let snapshot = {
            let mut session = self.session();
            session.current = Some(result.clone());
            if !self.config.history_enabled {
                return;
            }
            session.gallery.record(result.clone());
            session.gallery.to_vec()
        };

        if let Err(e) = self.history.save_history(&snapshot) {
            tracing::warn!("could not persist gallery: {e}");
            self.presenter.notify(&Notice::warning(format!(
                "Image generated, but the gallery could not be saved: {e}"
            )));
        }
        self.presenter.gallery(&snapshot);
    }

    /// Downloads the current image through the file saver.
    ///
    /// Returns `Ok(None)` when there is nothing to download.
    pub async fn download_current(&self) -> Result<Option<PathBuf>> {
        let Some(url) = self.current_image_url() else {
            return Ok(None);
        };

        match self.fetch_and_save(&url).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "image downloaded");
                self.presenter
                    .notify(&Notice::success("Image downloaded successfully!"));
                Ok(Some(path))
            }
            Err(e) => {
                tracing::warn!("download failed: {e}");
                self.presenter
                    .notify(&Notice::error("Failed to download image"));
                Err(e)
            }
        }
    }

    async fn fetch_and_save(&self, url: &str) -> Result<PathBuf> {
        let bytes = self.service.download(url).await?;
        let format = ImageFormat::from_magic_bytes(&bytes).unwrap_or_default();
        let file_name = format!(
            "freeai-generated-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            format.extension()
        );
        self.saver.save(&file_name, &bytes)
    }

    /// Copies the current image URL to the clipboard.
    ///
    /// Returns `Ok(None)` when there is nothing to copy.
    pub fn copy_current_url(&self) -> Result<Option<String>> {
        let Some(url) = self.current_image_url() else {
            return Ok(None);
        };

        match self.clipboard.write_text(&url) {
            Ok(()) => {
                self.presenter
                    .notify(&Notice::success("Image URL copied to clipboard!"));
                Ok(Some(url))
            }
            Err(e) => {
                tracing::warn!("copy failed: {e}");
                self.presenter.notify(&Notice::error("Failed to copy URL"));
                Err(e)
            }
        }
    }

    /// Forgets the current image and returns to the empty view.
    pub fn reset(&self) {
        self.session().current = None;
        self.presenter.placeholder();
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
