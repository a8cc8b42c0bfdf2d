//! Model load lifecycle
//!
//! Loading reports zero or more progress events followed by exactly one
//! terminal event. Browser callbacks and asset-server polling can both
//! produce events, so [`LoadTracker`] folds them into a single outcome and
//! drops anything that arrives after it.

/// Summary of a successfully loaded scene
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneSummary {
    /// Number of meshes in the loaded scene
    pub mesh_count: usize,
}

/// A single event from the asset loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Progress { loaded: u64, total: u64 },
    Completed(SceneSummary),
    Failed(String),
}

/// Terminal result of a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(SceneSummary),
    Failed(String),
}

/// What applying an event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadUpdate {
    /// Progress accepted; carries the new percentage if the total is known
    Progress(Option<u32>),
    /// The terminal outcome was recorded
    Finished,
    /// Event arrived after the terminal outcome and was dropped
    Ignored,
}

/// Folds loader events into one terminal outcome
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    percent: Option<u32>,
    outcome: Option<LoadOutcome>,
    delivered: bool,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    pub fn apply(&mut self, event: LoadEvent) -> LoadUpdate {
        if self.outcome.is_some() {
            tracing::debug!("Ignoring load event after terminal outcome: {:?}", event);
            return LoadUpdate::Ignored;
        }

        match event {
            LoadEvent::Progress { loaded, total } => {
                self.percent = percent(loaded, total);
                LoadUpdate::Progress(self.percent)
            }
            LoadEvent::Completed(summary) => {
                self.percent = Some(100);
                self.outcome = Some(LoadOutcome::Loaded(summary));
                LoadUpdate::Finished
            }
            LoadEvent::Failed(reason) => {
                self.outcome = Some(LoadOutcome::Failed(reason));
                LoadUpdate::Finished
            }
        }
    }

    /// Last known progress percentage
    pub fn percent(&self) -> Option<u32> {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Take the terminal outcome. Returns `Some` exactly once.
    pub fn take_outcome(&mut self) -> Option<LoadOutcome> {
        if self.delivered {
            return None;
        }
        let outcome = self.outcome.clone()?;
        self.delivered = true;
        Some(outcome)
    }
}

/// Whole-number percentage of `loaded` over `total`, rounded half up.
///
/// Returns `None` when the total is unknown (zero).
pub fn percent(loaded: u64, total: u64) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let (loaded, total) = (loaded as u128, total as u128);
    let pct = (loaded * 100 + total / 2) / total;
    Some(pct.min(100) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0, 200), Some(0));
        assert_eq!(percent(1, 200), Some(1)); // 0.5 rounds up
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(200, 200), Some(100));
        assert_eq!(percent(300, 200), Some(100));
        assert_eq!(percent(10, 0), None);
    }

    #[test]
    fn test_progress_then_complete() {
        let mut tracker = LoadTracker::new();
        assert_eq!(
            tracker.apply(LoadEvent::Progress { loaded: 50, total: 100 }),
            LoadUpdate::Progress(Some(50))
        );
        assert!(!tracker.is_finished());
        assert_eq!(tracker.take_outcome(), None);

        let summary = SceneSummary { mesh_count: 12 };
        assert_eq!(tracker.apply(LoadEvent::Completed(summary.clone())), LoadUpdate::Finished);
        assert_eq!(tracker.percent(), Some(100));
        assert_eq!(tracker.take_outcome(), Some(LoadOutcome::Loaded(summary)));
    }

    #[test]
    fn test_single_terminal_outcome() {
        let mut tracker = LoadTracker::new();
        tracker.apply(LoadEvent::Failed("404 Not Found".to_string()));
        assert_eq!(
            tracker.apply(LoadEvent::Completed(SceneSummary::default())),
            LoadUpdate::Ignored
        );
        assert_eq!(
            tracker.apply(LoadEvent::Progress { loaded: 1, total: 2 }),
            LoadUpdate::Ignored
        );
        assert_eq!(
            tracker.take_outcome(),
            Some(LoadOutcome::Failed("404 Not Found".to_string()))
        );
        // Delivered once only
        assert_eq!(tracker.take_outcome(), None);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_unknown_total_keeps_loading() {
        let mut tracker = LoadTracker::new();
        assert_eq!(
            tracker.apply(LoadEvent::Progress { loaded: 4096, total: 0 }),
            LoadUpdate::Progress(None)
        );
        assert_eq!(tracker.percent(), None);
        assert!(!tracker.is_finished());
    }
}
