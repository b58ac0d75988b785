//! crates/wordsprout_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or the
//! hosted auth provider.

use crate::domain::{
    Category, Checkpoint, GameScore, Lesson, LessonVersionMeta, MiniGame, Principal,
    StudentProfile, Video, VocabItem,
};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Table-style CRUD against the hosted content collections. Every lookup that
/// can miss reports `PortError::NotFound`; adapters never panic across this
/// boundary.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- Students ---
    async fn list_students(&self) -> PortResult<Vec<StudentProfile>>;

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<StudentProfile>;

    /// Exact-match lookup of a 4-digit PIN code.
    async fn find_student_by_pin(&self, pin: &str) -> PortResult<StudentProfile>;

    /// Case-insensitive fuzzy name lookup used by quick-login.
    async fn search_students_by_name(&self, name: &str) -> PortResult<Vec<StudentProfile>>;

    async fn create_student(&self, student: StudentProfile) -> PortResult<StudentProfile>;

    async fn update_student(&self, student: StudentProfile) -> PortResult<()>;

    async fn delete_student(&self, student_id: Uuid) -> PortResult<()>;

    // --- Videos ---
    async fn list_videos(&self) -> PortResult<Vec<Video>>;

    async fn create_video(&self, video: Video) -> PortResult<Video>;

    async fn update_video(&self, video: Video) -> PortResult<()>;

    async fn delete_video(&self, video_id: Uuid) -> PortResult<()>;

    // --- Vocabulary ---
    async fn list_vocabulary(&self, category_id: Option<Uuid>) -> PortResult<Vec<VocabItem>>;

    async fn create_vocab(&self, item: VocabItem) -> PortResult<VocabItem>;

    async fn update_vocab(&self, item: VocabItem) -> PortResult<()>;

    async fn delete_vocab(&self, vocab_id: Uuid) -> PortResult<()>;

    // --- Categories ---
    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    async fn create_category(&self, category: Category) -> PortResult<Category>;

    async fn update_category(&self, category: Category) -> PortResult<()>;

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()>;

    // --- Mini-games ---
    async fn list_games(&self) -> PortResult<Vec<MiniGame>>;

    async fn create_game(&self, game: MiniGame) -> PortResult<MiniGame>;

    async fn update_game(&self, game: MiniGame) -> PortResult<()>;

    async fn delete_game(&self, game_id: Uuid) -> PortResult<()>;

    // --- Scores ---
    async fn record_score(&self, score: GameScore) -> PortResult<()>;

    async fn list_scores_for_student(&self, student_id: Uuid) -> PortResult<Vec<GameScore>>;

    // --- Lessons and Checkpoints ---
    /// Loads a lesson together with its current version and checkpoint list.
    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    /// Replaces the full checkpoint list for a lesson's current version.
    async fn save_checkpoints(
        &self,
        lesson_id: Uuid,
        checkpoints: &[Checkpoint],
    ) -> PortResult<()>;

    /// Persists derived version metadata against an existing version row.
    async fn save_version_meta(
        &self,
        version_id: Uuid,
        meta: &LessonVersionMeta,
    ) -> PortResult<()>;

    /// Persists lesson title and description.
    async fn save_lesson_info(
        &self,
        lesson_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<()>;
}

/// The hosted auth provider used by the staff roles (admin, teacher, parent).
/// Students never go through this provider; their identity lives in the
/// session store.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Validates email credentials and opens a server-side session.
    /// Returns the resolved principal plus the session token to hand back to
    /// the client.
    async fn login(&self, email: &str, password: &str) -> PortResult<(Principal, String)>;

    /// Resolves the principal behind a previously issued session token.
    /// An unknown or expired token is `Ok(None)`, not an error.
    async fn current_user(&self, token: &str) -> PortResult<Option<Principal>>;

    /// Invalidates a session token. Idempotent.
    async fn logout(&self, token: &str) -> PortResult<()>;
}

/// The client-storage analog: a plain key to JSON-string map. Keys are
/// centralized in [`crate::session::keys`]; call sites never spell them out.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}
