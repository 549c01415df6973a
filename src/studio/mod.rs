//! Session controller and its collaborators.

pub mod config;
mod controller;
pub mod presenter;
pub mod progress;

pub use config::StudioConfig;
pub use controller::{Studio, StudioBuilder};
pub use presenter::{
    Notice, NoticeKind, NullPresenter, Presenter, PresenterEvent, RecordingPresenter,
};
pub use progress::ProgressTicker;
