//! services/api/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use crate::config::Config;
use std::sync::Arc;
use uuid::Uuid;
use wordsprout_core::auth::AuthResolver;
use wordsprout_core::domain::Lesson;
use wordsprout_core::editor::{EditorOptions, LessonEditor};
use wordsprout_core::ports::{AuthProvider, ContentStore, SessionStore};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<dyn ContentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub resolver: AuthResolver,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        content: Arc<dyn ContentStore>,
        auth: Arc<dyn AuthProvider>,
        sessions: Arc<dyn SessionStore>,
        config: Arc<Config>,
    ) -> Self {
        let resolver = AuthResolver::new(auth.clone(), content.clone(), sessions.clone());
        Self {
            content,
            auth,
            sessions,
            resolver,
            config,
        }
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            trigger_tolerance_sec: self.config.checkpoint_tolerance_sec,
            enforce_duration_bound: self.config.enforce_duration_bound,
        }
    }
}

//=========================================================================================
// PreviewState (Specific to One WebSocket Connection)
//=========================================================================================

/// The surface the preview connection was opened for: playback-only, or the
/// full editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    #[default]
    Video,
    Full,
}

impl PreviewMode {
    /// Whether timeline mutations are allowed on this surface.
    pub fn allows_editing(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// The state for a single, active WebSocket connection.
pub struct PreviewState {
    pub lesson_id: Uuid,
    pub mode: PreviewMode,
    pub editor: LessonEditor,
}

//=========================================================================================
// PreviewState Implementation (Constructor)
//=========================================================================================

impl PreviewState {
    /// Creates a new `PreviewState` over a lesson fetched by the caller.
    pub fn new(lesson: Lesson, mode: PreviewMode, options: EditorOptions) -> Self {
        Self {
            lesson_id: lesson.id,
            mode,
            editor: LessonEditor::new(lesson, options),
        }
    }
}
