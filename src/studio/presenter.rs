//! Outbound notifications from the controller to whatever renders it.

use crate::image::GenerationResult;
use std::sync::Mutex;

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something the user asked for worked.
    Success,
    /// It worked, with a caveat.
    Warning,
    /// It failed.
    Error,
}

/// A short transient message (download finished, copy failed, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// A warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Receives state changes from the controller. Calls carry no return value.
///
/// Only the state transitions are required; the rest default to no-ops so a
/// minimal front end can ignore them.
pub trait Presenter: Send + Sync {
    /// A generation started (`true`) or settled (`false`).
    fn busy(&self, busy: bool);

    /// The last generation failed, or the form was rejected.
    fn error(&self, message: &str);

    /// A generation succeeded.
    fn success(&self, result: &GenerationResult);

    /// The loading view should replace whatever is shown.
    fn loading(&self) {}

    /// Cosmetic progress, 0-100.
    fn progress(&self, _percent: u8) {}

    /// The gallery changed.
    fn gallery(&self, _entries: &[GenerationResult]) {}

    /// Nothing to show; back to the empty state.
    fn placeholder(&self) {}

    /// A transient notice from download, copy, or persistence.
    fn notify(&self, _notice: &Notice) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn busy(&self, _busy: bool) {}
    fn error(&self, _message: &str) {}
    fn success(&self, _result: &GenerationResult) {}
}

/// One call made on a [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    /// [`Presenter::busy`].
    Busy(bool),
    /// [`Presenter::loading`].
    Loading,
    /// [`Presenter::progress`].
    Progress(u8),
    /// [`Presenter::error`].
    Error(String),
    /// [`Presenter::success`].
    Success(GenerationResult),
    /// [`Presenter::gallery`], with the entry count.
    Gallery(usize),
    /// [`Presenter::placeholder`].
    Placeholder,
    /// [`Presenter::notify`].
    Notice(Notice),
}

/// Records every call in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    /// Creates a presenter with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far, in call order.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Events other than progress ticks, which are timing-dependent.
    pub fn state_events(&self) -> Vec<PresenterEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, PresenterEvent::Progress(_)))
            .collect()
    }

    fn push(&self, event: PresenterEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn busy(&self, busy: bool) {
        self.push(PresenterEvent::Busy(busy));
    }

    fn error(&self, message: &str) {
        self.push(PresenterEvent::Error(message.to_string()));
    }

    fn success(&self, result: &GenerationResult) {
        self.push(PresenterEvent::Success(result.clone()));
    }

    fn loading(&self) {
        self.push(PresenterEvent::Loading);
    }

    fn progress(&self, percent: u8) {
        self.push(PresenterEvent::Progress(percent));
    }

    fn gallery(&self, entries: &[GenerationResult]) {
        self.push(PresenterEvent::Gallery(entries.len()));
    }

    fn placeholder(&self) {
        self.push(PresenterEvent::Placeholder);
    }

    fn notify(&self, notice: &Notice) {
        self.push(PresenterEvent::Notice(notice.clone()));
    }
}
