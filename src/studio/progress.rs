//! Cosmetic progress indicator for in-flight generations.

use crate::studio::presenter::Presenter;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often the indicator advances.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// The indicator never passes this until the request settles.
pub const CEILING: f64 = 90.0;

/// Next progress value after one tick.
fn advance(current: f64, step: f64) -> f64 {
    (current + step).min(CEILING)
}

/// Advances a percentage toward [`CEILING`] on a fixed interval.
///
/// Dropping the ticker stops the task and reports 100, whatever the outcome
/// of the request it was tracking.
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    presenter: Arc<dyn Presenter>,
}

impl ProgressTicker {
    /// Starts ticking. Must be called from within a tokio runtime.
    pub fn start(presenter: Arc<dyn Presenter>, interval: Duration) -> Self {
        let sink = Arc::clone(&presenter);
        let handle = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut ticks = tokio::time::interval_at(first, interval);
            let mut progress = 0.0;
            loop {
                ticks.tick().await;
                let step = rand::thread_rng().gen_range(5.0..15.0);
                progress = advance(progress, step);
                sink.progress(progress as u8);
            }
        });

        Self {
            handle: Some(handle),
            presenter,
        }
    }

    /// A ticker that only reports completion when dropped.
    pub fn idle(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            handle: None,
            presenter,
        }
    }

    /// True while the background task is ticking.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.presenter.progress(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::presenter::{PresenterEvent, RecordingPresenter};

    #[test]
    fn test_advance_caps_at_ceiling() {
        assert_eq!(advance(0.0, 10.0), 10.0);
        assert_eq!(advance(85.0, 14.0), CEILING);
        assert_eq!(advance(CEILING, 5.0), CEILING);
    }

    fn progress_values(presenter: &RecordingPresenter) -> Vec<u8> {
        presenter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_stay_below_ceiling_then_snap_to_full() {
        let presenter = Arc::new(RecordingPresenter::new());
        let ticker = ProgressTicker::start(presenter.clone(), TICK_INTERVAL);
        assert!(ticker.is_running());

        tokio::time::sleep(Duration::from_secs(20)).await;
        let ticking = progress_values(&presenter);
        assert!(ticking.len() >= 10);
        assert!(ticking.windows(2).all(|w| w[0] <= w[1]));
        assert!(ticking.iter().all(|&p| p <= CEILING as u8));
        assert_eq!(*ticking.last().unwrap(), CEILING as u8);

        drop(ticker);
        let count_after_drop = progress_values(&presenter).len();
        assert_eq!(progress_values(&presenter).last(), Some(&100));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(progress_values(&presenter).len(), count_after_drop);
    }

    #[tokio::test]
    async fn test_idle_ticker_only_reports_completion() {
        let presenter = Arc::new(RecordingPresenter::new());
        let ticker = ProgressTicker::idle(presenter.clone());
        assert!(!ticker.is_running());
        drop(ticker);
        assert_eq!(presenter.events(), vec![PresenterEvent::Progress(100)]);
    }
}
