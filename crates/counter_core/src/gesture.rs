//! Vertical swipe input for the single-value variant.

pub const SWIPE_THRESHOLD_PX: f64 = 28.0;

/// Maps a finished vertical drag to a count delta. Upward drags (negative dy)
/// count up; drags shorter than the threshold do nothing.
pub fn delta_for_drag(dy: f64, threshold: f64) -> Option<i64> {
    if !dy.is_finite() {
        return None;
    }
    if dy < -threshold {
        Some(1)
    } else if dy > threshold {
        Some(-1)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    threshold: f64,
    start_y: Option<f64>,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD_PX)
    }
}

impl GestureTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_y: None,
        }
    }

    pub fn begin(&mut self, y: f64) {
        self.start_y = Some(y);
    }

    /// Ends the current drag. Without a matching `begin` there is nothing to measure.
    pub fn finish(&mut self, y: f64) -> Option<i64> {
        let start = self.start_y.take()?;
        delta_for_drag(y - start, self.threshold)
    }

    pub fn cancel(&mut self) {
        self.start_y = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.start_y.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upward_drag_past_threshold_counts_up() {
        assert_eq!(delta_for_drag(-28.5, SWIPE_THRESHOLD_PX), Some(1));
        assert_eq!(delta_for_drag(-200.0, SWIPE_THRESHOLD_PX), Some(1));
    }

    #[test]
    fn downward_drag_past_threshold_counts_down() {
        assert_eq!(delta_for_drag(29.0, SWIPE_THRESHOLD_PX), Some(-1));
    }

    #[test]
    fn short_drags_are_ignored() {
        assert_eq!(delta_for_drag(28.0, SWIPE_THRESHOLD_PX), None);
        assert_eq!(delta_for_drag(-28.0, SWIPE_THRESHOLD_PX), None);
        assert_eq!(delta_for_drag(0.0, SWIPE_THRESHOLD_PX), None);
        assert_eq!(delta_for_drag(f64::NAN, SWIPE_THRESHOLD_PX), None);
    }

    #[test]
    fn tracker_measures_from_the_drag_start() {
        let mut tracker = GestureTracker::default();
        tracker.begin(300.0);
        assert!(tracker.is_tracking());
        assert_eq!(tracker.finish(250.0), Some(1));
        assert!(!tracker.is_tracking());

        assert_eq!(tracker.finish(100.0), None);

        tracker.begin(100.0);
        tracker.cancel();
        assert_eq!(tracker.finish(300.0), None);
    }
}
