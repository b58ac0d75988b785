//! crates/wordsprout_core/src/timeline.rs
//!
//! The checkpoint timeline: a container that keeps checkpoints sorted
//! ascending by playback time as an invariant of the type, plus the playback
//! tracker that decides when a checkpoint fires during coarse progress ticks.

use crate::domain::Checkpoint;
use uuid::Uuid;

/// Forward tolerance applied to the trigger window, in seconds. Coarse
/// polling ticks can land just short of a checkpoint's timestamp; the
/// tolerance absorbs that jitter. Tunable per deployment via config.
pub const DEFAULT_TRIGGER_TOLERANCE_SEC: f64 = 0.25;

//=========================================================================================
// CheckpointTimeline
//=========================================================================================

/// An ordered list of checkpoints over a video timeline.
///
/// Invariants: entries are sorted non-decreasing by `time_sec` after every
/// mutation, and ids are unique (an upsert with a known id replaces the old
/// entry). The window-match algorithm in [`PlaybackTracker`] relies on the
/// sort order to pick the first matching checkpoint deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointTimeline {
    entries: Vec<Checkpoint>,
}

impl CheckpointTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a timeline from a list in any order, e.g. as loaded from the
    /// persistence collaborator.
    pub fn from_unsorted(mut checkpoints: Vec<Checkpoint>) -> Self {
        checkpoints.sort_by_key(|c| c.time_sec);
        Self {
            entries: checkpoints,
        }
    }

    /// Inserts a new checkpoint or replaces the entry with the same id,
    /// keeping the list sorted. Equal timestamps preserve insertion order.
    pub fn upsert(&mut self, checkpoint: Checkpoint) {
        self.entries.retain(|c| c.id != checkpoint.id);
        let at = self
            .entries
            .partition_point(|c| c.time_sec <= checkpoint.time_sec);
        self.entries.insert(at, checkpoint);
    }

    /// Removes a checkpoint by id, returning it if present.
    pub fn remove(&mut self, id: Uuid) -> Option<Checkpoint> {
        let index = self.entries.iter().position(|c| c.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&Checkpoint> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Checkpoint] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first checkpoint, in sort order, whose time falls inside the
    /// half-open window `(after, upto]`.
    fn first_in_window(&self, after: f64, upto: f64) -> Option<&Checkpoint> {
        self.entries.iter().find(|c| {
            let t = f64::from(c.time_sec);
            t > after && t <= upto
        })
    }
}

impl From<Vec<Checkpoint>> for CheckpointTimeline {
    fn from(checkpoints: Vec<Checkpoint>) -> Self {
        Self::from_unsorted(checkpoints)
    }
}

//=========================================================================================
// PlaybackTracker
//=========================================================================================

/// Tracks the playback cursor across progress ticks and decides when a
/// checkpoint fires.
///
/// Each tick forms the window `(previous tick, new tick + tolerance]`; the
/// first checkpoint in sort order inside that window triggers, unless it was
/// the most recently triggered one. The guard keeps a checkpoint from firing
/// twice when consecutive ticks straddle its boundary; it is cleared by a
/// seek, so moving past a checkpoint and coming back re-arms it.
#[derive(Debug, Clone)]
pub struct PlaybackTracker {
    last_time: f64,
    last_triggered: Option<Uuid>,
    tolerance: f64,
}

impl Default for PlaybackTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_TOLERANCE_SEC)
    }
}

impl PlaybackTracker {
    pub fn new(tolerance: f64) -> Self {
        Self {
            last_time: 0.0,
            last_triggered: None,
            tolerance,
        }
    }

    /// The playback position as of the last tick or seek.
    pub fn position(&self) -> f64 {
        self.last_time
    }

    /// Feeds one playback tick. Returns the checkpoint that should fire, if
    /// any; the caller pauses playback and surfaces the prompt.
    pub fn handle_progress<'a>(
        &mut self,
        now: f64,
        timeline: &'a CheckpointTimeline,
    ) -> Option<&'a Checkpoint> {
        let prev = self.last_time;
        self.last_time = now;
        if now <= prev {
            // A backwards tick without a seek carries no window to match.
            return None;
        }

        let hit = timeline.first_in_window(prev, now + self.tolerance)?;
        if self.last_triggered == Some(hit.id) {
            return None;
        }
        self.last_triggered = Some(hit.id);
        Some(hit)
    }

    /// Relocates the cursor. Resets the progress window to the target so
    /// checkpoints between the old and new position do not fire, and re-arms
    /// the last-triggered guard.
    pub fn handle_seek(&mut self, target: f64) {
        self.last_time = target;
        self.last_triggered = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::CheckpointKind;

    fn checkpoint_at(time_sec: u32) -> Checkpoint {
        Checkpoint::blank_at(time_sec, CheckpointKind::Vocab)
    }

    fn is_sorted(timeline: &CheckpointTimeline) -> bool {
        timeline
            .as_slice()
            .windows(2)
            .all(|w| w[0].time_sec <= w[1].time_sec)
    }

    #[test]
    fn test_from_unsorted_sorts_by_time() {
        let timeline =
            CheckpointTimeline::from_unsorted(vec![checkpoint_at(30), checkpoint_at(5), checkpoint_at(12)]);
        assert!(is_sorted(&timeline));
        assert_eq!(timeline.as_slice()[0].time_sec, 5);
    }

    #[test]
    fn test_upsert_keeps_order_for_any_insertion() {
        let mut timeline = CheckpointTimeline::new();
        for t in [40, 10, 25, 10, 0, 33] {
            timeline.upsert(checkpoint_at(t));
            assert!(is_sorted(&timeline), "unsorted after inserting t={t}");
        }
        assert_eq!(timeline.len(), 6);
    }

    #[test]
    fn test_upsert_replaces_by_id_and_repositions() {
        let mut timeline = CheckpointTimeline::from_unsorted(vec![
            checkpoint_at(5),
            checkpoint_at(20),
            checkpoint_at(40),
        ]);
        let mut moved = timeline.as_slice()[0].clone();
        moved.time_sec = 30;

        timeline.upsert(moved.clone());

        assert_eq!(timeline.len(), 3);
        assert!(is_sorted(&timeline));
        assert_eq!(timeline.get(moved.id).unwrap().time_sec, 30);
    }

    #[test]
    fn test_remove_by_id() {
        let mut timeline =
            CheckpointTimeline::from_unsorted(vec![checkpoint_at(5), checkpoint_at(20)]);
        let id = timeline.as_slice()[1].id;

        let removed = timeline.remove(id).unwrap();

        assert_eq!(removed.time_sec, 20);
        assert_eq!(timeline.len(), 1);
        assert!(timeline.remove(id).is_none());
    }

    #[test]
    fn test_progress_triggers_inside_window() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        assert!(tracker.handle_progress(9.5, &timeline).is_none());
        let hit = tracker.handle_progress(10.2, &timeline).unwrap();
        assert_eq!(hit.time_sec, 10);
    }

    #[test]
    fn test_coarse_tick_jumping_over_timestamp_still_triggers() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        // 2-second ticks never land on t=10 exactly.
        assert!(tracker.handle_progress(9.0, &timeline).is_none());
        assert!(tracker.handle_progress(11.0, &timeline).is_some());
    }

    #[test]
    fn test_tolerance_does_not_double_fire_across_straddling_ticks() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        // First tick reaches into the tolerance zone ahead of t=10.
        assert!(tracker.handle_progress(9.8, &timeline).is_some());
        // The next tick crosses t=10 itself; the guard suppresses a re-fire.
        assert!(tracker.handle_progress(10.1, &timeline).is_none());
        assert!(tracker.handle_progress(10.4, &timeline).is_none());
    }

    #[test]
    fn test_first_checkpoint_in_sort_order_wins_per_tick() {
        let early = checkpoint_at(10);
        let late = checkpoint_at(11);
        let early_id = early.id;
        let timeline = CheckpointTimeline::from_unsorted(vec![late, early]);
        let mut tracker = PlaybackTracker::default();

        let hit = tracker.handle_progress(12.0, &timeline).unwrap();
        assert_eq!(hit.id, early_id);
    }

    #[test]
    fn test_forward_seek_skips_intermediate_checkpoints() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        tracker.handle_progress(5.0, &timeline);
        tracker.handle_seek(30.0);

        // The checkpoint at t=10 sits between the old and new position; the
        // user intentionally skipped it.
        assert!(tracker.handle_progress(31.0, &timeline).is_none());
    }

    #[test]
    fn test_seek_back_re_arms_a_triggered_checkpoint() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        assert!(tracker.handle_progress(10.1, &timeline).is_some());
        tracker.handle_seek(8.0);
        assert!(tracker.handle_progress(10.1, &timeline).is_some());
    }

    #[test]
    fn test_backwards_tick_without_seek_is_inert() {
        let timeline = CheckpointTimeline::from_unsorted(vec![checkpoint_at(10)]);
        let mut tracker = PlaybackTracker::default();

        tracker.handle_progress(12.0, &timeline);
        assert!(tracker.handle_progress(11.0, &timeline).is_none());
        assert_eq!(tracker.position(), 11.0);
    }
}
