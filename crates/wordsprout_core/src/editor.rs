//! crates/wordsprout_core/src/editor.rs
//!
//! The lesson checkpoint editor: owns the editable in-memory state of one
//! lesson's checkpoint timeline and playback cursor, independent of the
//! concrete video-playback widget. Persistence happens only on an explicit
//! save, as a small saga of ordered steps with per-step outcomes.

use crate::domain::{
    Checkpoint, CheckpointKind, Difficulty, Lesson, LessonVersionMeta,
};
use crate::media::clean_video_url;
use crate::ports::{ContentStore, PortResult};
use crate::timeline::{CheckpointTimeline, PlaybackTracker};
use uuid::Uuid;

//=========================================================================================
// Options and Errors
//=========================================================================================

/// Tunables the original authoring tool hardcoded. The trigger tolerance and
/// the duration bound are pragmatic tuning, not contract, so both are
/// configurable; enforcement of `time_sec <= duration` is off by default to
/// match observed behavior.
#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub trigger_tolerance_sec: f64,
    pub enforce_duration_bound: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            trigger_tolerance_sec: crate::timeline::DEFAULT_TRIGGER_TOLERANCE_SEC,
            enforce_duration_bound: false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("checkpoint not found")]
    UnknownCheckpoint,
    #[error("checkpoint time {time_sec}s is past the lesson end ({duration_sec}s)")]
    BeyondDuration { time_sec: u32, duration_sec: u32 },
    #[error("no checkpoint modal is open")]
    NoModalOpen,
    #[error("no delete is pending confirmation")]
    NoDeletePending,
}

//=========================================================================================
// Editor Mode
//=========================================================================================

/// The editor surface state. Opening the modal or requesting a delete always
/// pauses playback; committing or cancelling returns to `Paused`.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    Playing,
    Paused,
    /// The edit modal is open over a draft (new or existing).
    Editing(Checkpoint),
    /// A delete was requested and awaits explicit confirmation.
    ConfirmingDelete(Uuid),
}

//=========================================================================================
// Save Saga
//=========================================================================================

/// The ordered persistence steps behind one explicit save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    Checkpoints,
    VersionMeta,
    LessonInfo,
}

/// One attempted step and how it went.
#[derive(Debug)]
pub struct StepOutcome {
    pub step: SaveStep,
    pub result: PortResult<()>,
}

/// The reduction over all attempted steps. Partial failure is reported to
/// the user as a single aggregate warning, not per-step detail.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub outcomes: Vec<StepOutcome>,
}

impl SaveReport {
    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failed_steps(&self) -> Vec<SaveStep> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.step)
            .collect()
    }

    /// The single user-facing message for this save.
    pub fn user_message(&self) -> &'static str {
        if self.is_complete_success() {
            "Đã lưu bài học"
        } else {
            "Một số thay đổi chưa được lưu, vui lòng thử lại"
        }
    }
}

//=========================================================================================
// LessonEditor
//=========================================================================================

/// In-memory editing state for one lesson.
pub struct LessonEditor {
    lesson_id: Uuid,
    version_id: Option<Uuid>,
    title: String,
    description: String,
    video_url_input: String,
    difficulty: Difficulty,
    duration_sec: u32,
    vocabulary_ids: Vec<Uuid>,
    timeline: CheckpointTimeline,
    tracker: PlaybackTracker,
    mode: EditorMode,
    // Snapshot for change detection on save.
    original_title: String,
    original_description: String,
    options: EditorOptions,
}

impl LessonEditor {
    pub fn new(lesson: Lesson, options: EditorOptions) -> Self {
        Self {
            lesson_id: lesson.id,
            version_id: lesson.version.id,
            original_title: lesson.title.clone(),
            original_description: lesson.description.clone(),
            title: lesson.title,
            description: lesson.description,
            video_url_input: lesson.video_url,
            difficulty: lesson.difficulty,
            duration_sec: lesson.duration_sec,
            vocabulary_ids: lesson.target_vocabulary.iter().map(|v| v.id).collect(),
            timeline: CheckpointTimeline::from_unsorted(lesson.version.checkpoints),
            tracker: PlaybackTracker::new(options.trigger_tolerance_sec),
            mode: EditorMode::Paused,
            options,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn timeline(&self) -> &CheckpointTimeline {
        &self.timeline
    }

    pub fn position(&self) -> f64 {
        self.tracker.position()
    }

    // --- Form fields ---

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub fn set_video_url(&mut self, raw: String) {
        self.video_url_input = raw;
    }

    pub fn set_difficulty_label(&mut self, label: &str) {
        self.difficulty = Difficulty::from_label(label);
    }

    pub fn set_vocabulary_ids(&mut self, ids: Vec<Uuid>) {
        self.vocabulary_ids = ids;
    }

    // --- Playback ---

    pub fn play(&mut self) {
        if matches!(self.mode, EditorMode::Paused | EditorMode::Playing) {
            self.mode = EditorMode::Playing;
        }
    }

    pub fn pause(&mut self) {
        if matches!(self.mode, EditorMode::Playing) {
            self.mode = EditorMode::Paused;
        }
    }

    /// Feeds a playback tick. When a checkpoint fires, playback pauses and
    /// the checkpoint is returned for a one-shot notification.
    pub fn handle_progress(&mut self, now: f64) -> Option<Checkpoint> {
        if self.mode != EditorMode::Playing {
            return None;
        }
        let hit = self.tracker.handle_progress(now, &self.timeline).cloned();
        if hit.is_some() {
            self.mode = EditorMode::Paused;
        }
        hit
    }

    pub fn handle_seek(&mut self, target: f64) {
        self.tracker.handle_seek(target);
    }

    // --- Checkpoint editing ---

    /// Pauses playback and opens the modal over a blank checkpoint at the
    /// given time, or at the current playback position.
    pub fn add_checkpoint(&mut self, time_sec: Option<u32>, kind: Option<CheckpointKind>) {
        let at = time_sec.unwrap_or_else(|| self.tracker.position().max(0.0) as u32);
        let draft = Checkpoint::blank_at(at, kind.unwrap_or_default());
        self.mode = EditorMode::Editing(draft);
    }

    /// Pauses playback and opens the modal over an existing checkpoint.
    pub fn edit_checkpoint(&mut self, id: Uuid) -> Result<(), EditorError> {
        let existing = self
            .timeline
            .get(id)
            .cloned()
            .ok_or(EditorError::UnknownCheckpoint)?;
        self.mode = EditorMode::Editing(existing);
        Ok(())
    }

    /// Commits the modal's checkpoint: upsert by id into the timeline, which
    /// re-establishes ascending time order as part of the insert.
    pub fn save_from_modal(&mut self, checkpoint: Checkpoint) -> Result<(), EditorError> {
        if !matches!(self.mode, EditorMode::Editing(_)) {
            return Err(EditorError::NoModalOpen);
        }
        if self.options.enforce_duration_bound && checkpoint.time_sec > self.duration_sec {
            return Err(EditorError::BeyondDuration {
                time_sec: checkpoint.time_sec,
                duration_sec: self.duration_sec,
            });
        }
        self.timeline.upsert(checkpoint);
        self.mode = EditorMode::Paused;
        Ok(())
    }

    /// Closes the modal or an unconfirmed delete without mutating anything.
    pub fn cancel_modal(&mut self) {
        if matches!(
            self.mode,
            EditorMode::Editing(_) | EditorMode::ConfirmingDelete(_)
        ) {
            self.mode = EditorMode::Paused;
        }
    }

    /// First phase of the delete flow: mark the checkpoint for deletion and
    /// wait for confirmation. Nothing is removed yet.
    pub fn request_delete(&mut self, id: Uuid) -> Result<(), EditorError> {
        if self.timeline.get(id).is_none() {
            return Err(EditorError::UnknownCheckpoint);
        }
        self.mode = EditorMode::ConfirmingDelete(id);
        Ok(())
    }

    /// Second phase: commit the pending delete. No undo.
    pub fn confirm_delete(&mut self) -> Result<Checkpoint, EditorError> {
        let EditorMode::ConfirmingDelete(id) = &self.mode else {
            return Err(EditorError::NoDeletePending);
        };
        let id = *id;
        let removed = self
            .timeline
            .remove(id)
            .ok_or(EditorError::UnknownCheckpoint)?;
        self.mode = EditorMode::Paused;
        Ok(removed)
    }

    // --- Persistence ---

    /// Runs the three-part save sequence. Steps are attempted in order and
    /// independently: a failed step never stops the later ones, and the
    /// per-step results are reduced into one aggregate report. Step two only
    /// runs when a version row exists; step three only when title or
    /// description actually changed.
    pub async fn save(&mut self, store: &dyn ContentStore) -> SaveReport {
        let mut report = SaveReport::default();

        report.outcomes.push(StepOutcome {
            step: SaveStep::Checkpoints,
            result: store
                .save_checkpoints(self.lesson_id, self.timeline.as_slice())
                .await,
        });

        if let Some(version_id) = self.version_id {
            let meta = LessonVersionMeta {
                video_url: clean_video_url(&self.video_url_input),
                difficulty: self.difficulty,
                vocabulary_ids: self.vocabulary_ids.clone(),
            };
            report.outcomes.push(StepOutcome {
                step: SaveStep::VersionMeta,
                result: store.save_version_meta(version_id, &meta).await,
            });
        }

        if self.title != self.original_title || self.description != self.original_description {
            report.outcomes.push(StepOutcome {
                step: SaveStep::LessonInfo,
                result: store
                    .save_lesson_info(self.lesson_id, &self.title, &self.description)
                    .await,
            });
        }

        if report.is_complete_success() {
            self.original_title = self.title.clone();
            self.original_description = self.description.clone();
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::{CheckpointContent, LessonVersion, VocabItem};
    use crate::testing::{FailureFlags, FakeContentStore};

    fn lesson(version_id: Option<Uuid>, checkpoints: Vec<Checkpoint>) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            title: "Colors".to_string(),
            description: "Learn the colors".to_string(),
            video_url: "https://youtu.be/dQw4w9WgXcQ?t=5".to_string(),
            duration_sec: 180,
            difficulty: Difficulty::Beginner,
            version: LessonVersion {
                id: version_id,
                checkpoints,
            },
            target_vocabulary: vec![VocabItem {
                id: Uuid::new_v4(),
                word: "red".to_string(),
                meaning: "màu đỏ".to_string(),
                category_id: None,
            }],
        }
    }

    fn editor(version_id: Option<Uuid>) -> LessonEditor {
        LessonEditor::new(lesson(version_id, Vec::new()), EditorOptions::default())
    }

    fn is_sorted(timeline: &CheckpointTimeline) -> bool {
        timeline
            .as_slice()
            .windows(2)
            .all(|w| w[0].time_sec <= w[1].time_sec)
    }

    #[test]
    fn test_add_opens_modal_with_blank_draft() {
        let mut ed = editor(None);
        ed.add_checkpoint(Some(12), None);

        match ed.mode() {
            EditorMode::Editing(draft) => {
                assert_eq!(draft.time_sec, 12);
                assert_eq!(draft.kind, CheckpointKind::Vocab);
                assert_eq!(draft.content, CheckpointContent::default());
            }
            other => panic!("expected modal open, got {other:?}"),
        }
    }

    #[test]
    fn test_add_defaults_to_current_playback_time() {
        let mut ed = editor(None);
        ed.play();
        ed.handle_progress(37.6);

        ed.add_checkpoint(None, Some(CheckpointKind::Question));
        match ed.mode() {
            EditorMode::Editing(draft) => assert_eq!(draft.time_sec, 37),
            other => panic!("expected modal open, got {other:?}"),
        }
    }

    #[test]
    fn test_modal_save_keeps_timeline_sorted() {
        let mut ed = editor(None);
        for t in [25, 5, 60, 12] {
            ed.add_checkpoint(Some(t), None);
            let EditorMode::Editing(draft) = ed.mode().clone() else {
                panic!("modal should be open");
            };
            ed.save_from_modal(draft).unwrap();
        }
        assert_eq!(ed.timeline().len(), 4);
        assert!(is_sorted(ed.timeline()));
        assert_eq!(ed.mode(), &EditorMode::Paused);
    }

    #[test]
    fn test_modal_save_requires_open_modal() {
        let mut ed = editor(None);
        let orphan = Checkpoint::blank_at(3, CheckpointKind::Note);
        assert_eq!(
            ed.save_from_modal(orphan).unwrap_err(),
            EditorError::NoModalOpen
        );
    }

    #[test]
    fn test_duration_bound_enforced_only_when_enabled() {
        let mut relaxed = editor(None);
        relaxed.add_checkpoint(Some(999), None);
        let EditorMode::Editing(draft) = relaxed.mode().clone() else {
            panic!("modal should be open");
        };
        assert!(relaxed.save_from_modal(draft).is_ok());

        let mut strict = LessonEditor::new(
            lesson(None, Vec::new()),
            EditorOptions {
                enforce_duration_bound: true,
                ..EditorOptions::default()
            },
        );
        strict.add_checkpoint(Some(999), None);
        let EditorMode::Editing(draft) = strict.mode().clone() else {
            panic!("modal should be open");
        };
        assert_eq!(
            strict.save_from_modal(draft).unwrap_err(),
            EditorError::BeyondDuration {
                time_sec: 999,
                duration_sec: 180
            }
        );
    }

    #[test]
    fn test_checkpoint_trigger_pauses_playback() {
        let cp = Checkpoint::blank_at(10, CheckpointKind::Vocab);
        let mut ed = LessonEditor::new(lesson(None, vec![cp]), EditorOptions::default());

        ed.play();
        assert!(ed.handle_progress(5.0).is_none());
        let hit = ed.handle_progress(10.2).unwrap();

        assert_eq!(hit.time_sec, 10);
        assert_eq!(ed.mode(), &EditorMode::Paused);
        // Paused playback produces no further ticks worth matching.
        assert!(ed.handle_progress(10.4).is_none());
    }

    #[test]
    fn test_two_phase_delete() {
        let cp = Checkpoint::blank_at(10, CheckpointKind::Vocab);
        let id = cp.id;
        let mut ed = LessonEditor::new(lesson(None, vec![cp]), EditorOptions::default());

        // Confirming with nothing pending is an error.
        assert_eq!(ed.confirm_delete().unwrap_err(), EditorError::NoDeletePending);

        ed.request_delete(id).unwrap();
        assert_eq!(ed.timeline().len(), 1, "nothing removed before confirm");

        let removed = ed.confirm_delete().unwrap();
        assert_eq!(removed.id, id);
        assert!(ed.timeline().is_empty());
    }

    #[test]
    fn test_cancel_leaves_pending_delete_intact() {
        let cp = Checkpoint::blank_at(10, CheckpointKind::Vocab);
        let id = cp.id;
        let mut ed = LessonEditor::new(lesson(None, vec![cp]), EditorOptions::default());

        ed.request_delete(id).unwrap();
        ed.cancel_modal();

        assert_eq!(ed.mode(), &EditorMode::Paused);
        assert_eq!(ed.timeline().len(), 1);
    }

    #[tokio::test]
    async fn test_save_runs_all_three_steps() {
        let store = FakeContentStore::default();
        let mut ed = editor(Some(Uuid::new_v4()));
        ed.set_title("Colors and shapes".to_string());

        let report = ed.save(&store).await;

        assert!(report.is_complete_success());
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.user_message(), "Đã lưu bài học");
        assert_eq!(
            store.saved_info().unwrap().0,
            "Colors and shapes".to_string()
        );
    }

    #[tokio::test]
    async fn test_save_skips_version_step_without_version_id() {
        let store = FakeContentStore::default();
        let mut ed = editor(None);

        let report = ed.save(&store).await;

        assert!(report.is_complete_success());
        assert_eq!(report.outcomes.len(), 1);
        assert!(store.saved_meta().is_none());
    }

    #[tokio::test]
    async fn test_save_skips_info_step_when_unchanged() {
        let store = FakeContentStore::default();
        let mut ed = editor(Some(Uuid::new_v4()));

        let report = ed.save(&store).await;

        assert_eq!(report.outcomes.len(), 2);
        assert!(store.saved_info().is_none());
    }

    #[tokio::test]
    async fn test_save_version_meta_is_cleaned_and_numeric() {
        let store = FakeContentStore::default();
        let mut ed = editor(Some(Uuid::new_v4()));
        ed.set_difficulty_label("Advanced");

        ed.save(&store).await;

        let meta = store.saved_meta().unwrap();
        assert_eq!(meta.video_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(meta.difficulty.ordinal(), 3);
        assert_eq!(meta.vocabulary_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_still_attempts_later_steps() {
        let store = FakeContentStore::default().failing(FailureFlags {
            version_meta: true,
            ..FailureFlags::default()
        });
        let mut ed = editor(Some(Uuid::new_v4()));
        ed.set_description("Now with shapes".to_string());

        let report = ed.save(&store).await;

        assert!(!report.is_complete_success());
        assert_eq!(report.failed_steps(), vec![SaveStep::VersionMeta]);
        assert_eq!(
            report.user_message(),
            "Một số thay đổi chưa được lưu, vui lòng thử lại"
        );
        // The steps around the failure still ran.
        assert!(store.saved_checkpoints().is_some());
        assert!(store.saved_info().is_some());
    }

    #[tokio::test]
    async fn test_add_at_twelve_saves_single_sorted_entry() {
        let store = FakeContentStore::default();
        let mut ed = editor(None);
        ed.add_checkpoint(Some(12), Some(CheckpointKind::Vocab));
        let EditorMode::Editing(draft) = ed.mode().clone() else {
            panic!("modal should be open");
        };
        ed.save_from_modal(draft).unwrap();

        ed.save(&store).await;

        let saved = store.saved_checkpoints().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].time_sec, 12);
        assert_eq!(saved[0].content, CheckpointContent::default());
    }
}
